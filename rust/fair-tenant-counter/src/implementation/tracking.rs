use async_trait::async_trait;
use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::sync::Mutex;

use crate::{BucketKey, CounterStore, CounterStoreError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterStats {
    pub events_recorded: usize,
    pub failures: usize,
    pub keys: HashSet<BucketKey>,
}

/// This is a counter store wrapper that tracks calls made through it. It is
/// all runtime overhead and should only be used for testing, e.g. to assert
/// that a code path never touched the counters at all.
#[derive(Debug, Clone)]
pub struct TrackingCounterStore<S: CounterStore> {
    stats: Arc<Mutex<CounterStats>>,
    store: S,
}

impl<S: CounterStore> TrackingCounterStore<S> {
    pub async fn to_stats(&self) -> CounterStats {
        self.stats.lock().await.clone()
    }

    pub fn wrap(store: S) -> Self {
        TrackingCounterStore {
            store,
            stats: Default::default(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<S: CounterStore> CounterStore for TrackingCounterStore<S> {
    async fn record_event(
        &self,
        key: &BucketKey,
        window: Duration,
    ) -> Result<u64, CounterStoreError> {
        let result = self.store.record_event(key, window).await;

        let mut stats = self.stats.lock().await;
        stats.events_recorded += 1;
        stats.keys.insert(key.clone());
        if result.is_err() {
            stats.failures += 1;
        }

        result
    }
}
