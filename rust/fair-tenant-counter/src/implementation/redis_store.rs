use anyhow::anyhow;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};
use std::time::Duration;

use crate::{window_millis, BucketKey, CounterStore, CounterStoreError};

/// A Redis-backed [CounterStore] implementation, suitable for sharing counters
/// between every process that enqueues jobs.
///
/// Each event runs `SET key 0 PX <window> NX` followed by `INCR key` inside a
/// single MULTI/EXEC transaction: the `SET` only succeeds (and only sets an
/// expiry) when the key does not exist yet, so concurrent submitters can
/// neither lose an increment nor push an existing window's expiry out.
#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
}

impl RedisCounterStore {
    /// Connect to the Redis instance at `url` (e.g. `redis://127.0.0.1/`).
    /// The underlying connection reconnects on its own after failures.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(RedisCounterStore { connection })
    }

    pub fn new(connection: ConnectionManager) -> Self {
        RedisCounterStore { connection }
    }
}

impl std::fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCounterStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn record_event(
        &self,
        key: &BucketKey,
        window: Duration,
    ) -> Result<u64, CounterStoreError> {
        let window_ms = window_millis(window)?;

        let mut connection = self.connection.clone();
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(key.as_str())
            .arg(0)
            .arg("PX")
            .arg(window_ms)
            .arg("NX")
            .ignore()
            .cmd("INCR")
            .arg(key.as_str())
            .query_async(&mut connection)
            .await
            .map_err(|error| anyhow!(error))?;

        trace!("Recorded event {} for {}", count, key);

        Ok(count)
    }
}
