use fair_tenant_counter::CounterStoreError;
use thiserror::Error;

use crate::{QueueName, SlotName};

/// Problems with a job type's fair-tenant configuration. These are raised when
/// a job type is registered, so a bad configuration fails before any job is
/// routed with it.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Job type name must not be empty")]
    EmptyJobName,

    #[error("Job type '{0}' has no declared queue")]
    MissingQueue(String),

    #[error("Queue and slot names must not be empty")]
    EmptyName,

    #[error("Tier for '{0}' must have a threshold of at least 1")]
    InvalidThreshold(QueueName),

    #[error("Tier for '{0}' must have a window longer than zero")]
    InvalidWindow(QueueName),

    #[error("Tier for '{queue}' references slot '{slot}', which is not declared")]
    UnknownSlot { queue: QueueName, slot: SlotName },

    #[error("Slot '{0}' has no queues")]
    EmptySlot(SlotName),

    #[error("Queue '{queue}' cannot belong to both slot '{first}' and slot '{second}'")]
    ConflictingSlot {
        queue: QueueName,
        first: SlotName,
        second: SlotName,
    },

    #[error("Job type '{0}' is registered more than once")]
    DuplicateJobType(String),

    #[error("Counter store timeout must be longer than zero")]
    InvalidStoreTimeout,
}

/// The ways a routing decision can fail. None of these are retried by the
/// router; the enqueue call that asked for a queue should fail instead of
/// falling back to an unthrottled queue.
#[derive(Error, Debug)]
pub enum FairTenantError {
    /// The counter store failed or did not answer in time
    #[error("Fair-tenant counters are unavailable: {0}")]
    StoreUnavailable(#[from] CounterStoreError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The job type's tenant resolver failed and no fallback tenant is declared
    #[error("Could not resolve a tenant for job type '{job_type}': {source}")]
    TenantResolution {
        job_type: String,
        source: anyhow::Error,
    },
}
