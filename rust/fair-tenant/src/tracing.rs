//! Helpers to wrangle logging for fair-tenant routing.
//! NOTE: [initialize_tracing] should only ever be called in tests or binaries;
//! a library should only concern itself with instrumentation and logging.
use std::sync::Once;

static INITIALIZE_TRACING: Once = Once::new();

/// Install a global subscriber that prints events filtered by `RUST_LOG`,
/// falling back to this crate's and the counter crate's default level. Calling
/// it more than once has no further effect. If another global subscriber was
/// installed first, it is left in place and a warning is logged through it.
pub fn initialize_tracing() {
    use tracing_subscriber::prelude::*;
    INITIALIZE_TRACING.call_once(|| {
        if let Err(error) = tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(
                std::env::var("RUST_LOG")
                    .unwrap_or_else(|_| "fair_tenant,fair_tenant_counter".into()),
            ))
            .with(tracing_subscriber::fmt::layer())
            .try_init()
        {
            warn!("Kept the existing tracing subscriber: {}", error);
        }
    });
}
