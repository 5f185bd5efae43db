use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::Instant};

use crate::{BucketKey, CounterStore, CounterStoreError};

#[derive(Clone, Copy, Debug)]
struct CounterEntry {
    count: u64,
    expires_at: Instant,
}

impl CounterEntry {
    fn is_live_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// A memory-backed [CounterStore] implementation.
///
/// Every increment happens while holding a single lock over all counters, which
/// makes "create with expiry, then increment" atomic for concurrent callers in
/// the same process. Expired counters are replaced lazily the next time their
/// key is touched; [MemoryCounterStore::purge_expired] can be called to drop
/// the ones that are never touched again.
///
/// Useful for tests and single-process deployments. Time is read from
/// [tokio::time::Instant], so tests may pause and advance the clock.
#[derive(Clone, Default, Debug)]
pub struct MemoryCounterStore {
    entries: Arc<Mutex<HashMap<BucketKey, CounterEntry>>>,
}

impl MemoryCounterStore {
    /// Read the live count for `key` without recording an event.
    pub async fn peek(&self, key: &BucketKey) -> Option<u64> {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .get(key)
            .filter(|entry| entry.is_live_at(now))
            .map(|entry| entry.count)
    }

    /// Drop every counter whose window has lapsed, returning how many were
    /// removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();

        entries.retain(|_, entry| entry.is_live_at(now));

        let purged = before - entries.len();
        if purged > 0 {
            trace!("Purged {} expired counters", purged);
        }
        purged
    }

    /// The number of counters currently held, including expired ones that
    /// have not been purged yet.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl CounterStore for MemoryCounterStore {
    async fn record_event(
        &self,
        key: &BucketKey,
        window: Duration,
    ) -> Result<u64, CounterStoreError> {
        if window.is_zero() {
            return Err(CounterStoreError::InvalidWindow);
        }

        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        let fresh = CounterEntry {
            count: 0,
            expires_at: now + window,
        };
        let entry = entries.entry(key.clone()).or_insert(fresh);

        if !entry.is_live_at(now) {
            *entry = fresh;
        }
        entry.count += 1;

        Ok(entry.count)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{BucketKey, CounterStore, CounterStoreError, MemoryCounterStore};

    const HOUR: Duration = Duration::from_secs(60 * 60);

    #[tokio::test(start_paused = true)]
    async fn it_restarts_a_counter_once_its_window_lapses() {
        let store = MemoryCounterStore::default();
        let key = BucketKey::from("tenant");

        assert_eq!(store.record_event(&key, HOUR).await.unwrap(), 1);
        assert_eq!(store.record_event(&key, HOUR).await.unwrap(), 2);

        tokio::time::advance(HOUR + Duration::from_secs(1)).await;

        assert_eq!(store.peek(&key).await, None);
        assert_eq!(store.record_event(&key, HOUR).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn it_keeps_the_expiry_of_the_first_event_in_a_window() {
        let store = MemoryCounterStore::default();
        let key = BucketKey::from("sticky");

        store.record_event(&key, HOUR).await.unwrap();
        tokio::time::advance(Duration::from_secs(50 * 60)).await;
        assert_eq!(store.record_event(&key, HOUR).await.unwrap(), 2);

        // Still inside the window anchored to the first event
        tokio::time::advance(Duration::from_secs(9 * 60)).await;
        assert_eq!(store.record_event(&key, HOUR).await.unwrap(), 3);

        // A later event must not have pushed the expiry out
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(store.record_event(&key, HOUR).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn it_keeps_counters_for_different_keys_apart() {
        let store = MemoryCounterStore::default();
        let foo = BucketKey::from("foo");
        let bar = BucketKey::from("bar");

        store.record_event(&foo, HOUR).await.unwrap();
        store.record_event(&foo, HOUR).await.unwrap();

        assert_eq!(store.record_event(&bar, HOUR).await.unwrap(), 1);
        assert_eq!(store.peek(&foo).await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn it_purges_only_expired_counters() {
        let store = MemoryCounterStore::default();

        store
            .record_event(&BucketKey::from("short"), Duration::from_secs(1))
            .await
            .unwrap();
        store
            .record_event(&BucketKey::from("long"), HOUR)
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.len().await, 2);
        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.peek(&BucketKey::from("long")).await, Some(1));
    }

    #[tokio::test]
    async fn it_rejects_an_empty_window() {
        let store = MemoryCounterStore::default();
        let result = store
            .record_event(&BucketKey::from("empty"), Duration::ZERO)
            .await;

        assert!(matches!(result, Err(CounterStoreError::InvalidWindow)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn it_never_loses_increments_under_concurrency() {
        let store = MemoryCounterStore::default();
        let key = BucketKey::from("contended");

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let store = store.clone();
                let key = key.clone();
                tokio::spawn(async move { store.record_event(&key, HOUR).await })
            })
            .collect();

        let mut counts = Vec::new();
        for handle in handles {
            counts.push(handle.await.unwrap().unwrap());
        }
        counts.sort_unstable();

        assert_eq!(counts, (1..=64).collect::<Vec<u64>>());
        assert_eq!(store.peek(&key).await, Some(64));
    }
}
