use std::time::Duration;

use thiserror::Error;

/// Failures that may occur while recording an event in a [crate::CounterStore]
#[derive(Error, Debug)]
pub enum CounterStoreError {
    /// The backing store could not be reached or rejected the operation
    #[error("Counter store unavailable: {0}")]
    Unavailable(anyhow::Error),

    /// The backing store did not answer within the configured bound
    #[error("Counter store did not respond within {0:?}")]
    TimedOut(Duration),

    /// Counters cannot be created with an empty or unrepresentably long window
    #[error("Counter window must be longer than zero and expressible in milliseconds")]
    InvalidWindow,
}

impl From<anyhow::Error> for CounterStoreError {
    fn from(error: anyhow::Error) -> Self {
        CounterStoreError::Unavailable(error)
    }
}
