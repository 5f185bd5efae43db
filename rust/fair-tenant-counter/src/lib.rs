//! This crate contains the counter interface that fair-tenant admission is
//! built on, along with concrete implementations of it. A counter is an atomic,
//! expiring integer keyed by an opaque [BucketKey]: recording an event against
//! a key increments it and reports the new count, and the first event recorded
//! against a missing key decides when that key expires.
//!
//! Current backends are an in-process map ([MemoryCounterStore]) and, behind
//! the `redis` feature, a shared Redis instance (`RedisCounterStore`).

#[macro_use]
extern crate tracing;

mod counter;
mod error;
mod implementation;
mod key;
mod timeout;

pub use counter::*;
pub use error::*;
pub use implementation::*;
pub use key::*;
pub use timeout::*;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{BucketKey, CounterStore, MemoryCounterStore};

    #[tokio::test(start_paused = true)]
    async fn it_counts_events_within_a_window() {
        let store = MemoryCounterStore::default();
        let key = BucketKey::compose("test", &["tenant", "hourly"]);
        let hour = Duration::from_secs(60 * 60);

        assert_eq!(store.record_event(&key, hour).await.unwrap(), 1);
        assert_eq!(store.record_event(&key, hour).await.unwrap(), 2);
        assert_eq!(store.record_event(&key, hour).await.unwrap(), 3);
    }
}
