use async_trait::async_trait;
use std::time::Duration;
use tokio::select;

use crate::{BucketKey, CounterStore, CounterStoreError};

/// Implements timeout logic for recording events in a [CounterStore]. Any
/// [CounterStore] can be wrapped by [CounterStoreTimeout] so that a call never
/// waits longer than `timeout` on the backend; a call that runs out of time
/// fails with [CounterStoreError::TimedOut].
///
/// Unlike a read, recording an event is not idempotent: a timed out increment
/// may still have been applied by the backend. For that reason no attempt is
/// ever repeated here, and callers that choose to retry should expect a
/// slight over-count.
///
/// An in-process store like [crate::MemoryCounterStore] won't benefit much from
/// this, but network backends such as Redis must be bounded so that a
/// struggling cache cannot hang every enqueue call indefinitely.
#[derive(Clone, Debug)]
pub struct CounterStoreTimeout<S>
where
    S: CounterStore,
{
    store: S,
    timeout: Duration,
}

impl<S> CounterStoreTimeout<S>
where
    S: CounterStore,
{
    pub fn new(store: S, timeout: Duration) -> Self {
        CounterStoreTimeout { store, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn inner(&self) -> &S {
        &self.store
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<S> CounterStore for CounterStoreTimeout<S>
where
    S: CounterStore,
{
    async fn record_event(
        &self,
        key: &BucketKey,
        window: Duration,
    ) -> Result<u64, CounterStoreError> {
        select! {
            result = self.store.record_event(key, window) => {
                if let Err(error) = &result {
                    warn!("Error while recording event for {}: {}", key, error);
                }
                result
            },
            _ = tokio::time::sleep(self.timeout) => {
                warn!("Timed out recording event for {} after {:?}...", key, self.timeout);
                Err(CounterStoreError::TimedOut(self.timeout))
            }
        }
    }
}
