use std::time::Duration;

use async_trait::async_trait;

use crate::{BucketKey, CounterStoreError};

#[cfg(not(target_arch = "wasm32"))]
pub trait CounterStoreSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<S> CounterStoreSendSync for S where S: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait CounterStoreSendSync {}

#[cfg(target_arch = "wasm32")]
impl<S> CounterStoreSendSync for S {}

/// Convert a counter window to the whole number of milliseconds a store
/// should keep the counter alive for. Sub-millisecond remainders round up so a
/// window never expires early; an empty window or one too long to express in
/// milliseconds is rejected.
pub fn window_millis(window: Duration) -> Result<u64, CounterStoreError> {
    if window.is_zero() {
        return Err(CounterStoreError::InvalidWindow);
    }

    let mut millis = window.as_millis();
    if window.subsec_nanos() % 1_000_000 != 0 {
        millis += 1;
    }

    u64::try_from(millis).map_err(|_| CounterStoreError::InvalidWindow)
}

/// A primitive interface for atomic, expiring counters.
///
/// Implementations must behave as if every call to [CounterStore::record_event]
/// ran the following steps as one indivisible operation:
///
/// 1. If no live counter exists for `key`, create one with a value of 0 that
///    expires `window` from now.
/// 2. Increment the counter and return its new value.
///
/// The expiry of an existing counter is never extended, so a window is
/// anchored to the first event recorded after the previous window lapsed.
/// This approximates a sliding window at O(1) cost per event, with the known
/// caveat that up to `2 × window` worth of events can be observed by a single
/// threshold check under unlucky timing.
///
/// Counters never decrement; they only disappear by expiring.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait CounterStore: Clone + CounterStoreSendSync {
    /// Record one event against `key` and return the number of events recorded
    /// against it in the current window (including this one).
    async fn record_event(&self, key: &BucketKey, window: Duration)
        -> Result<u64, CounterStoreError>;
}
