//! Fair-tenant admission for background job queues.
//!
//! Every time a job is enqueued, a [FairTenantRouter] counts it against the
//! tenant that owns it, and if that tenant has recently submitted more jobs
//! than a configured [Tier] allows, sends the job to the tier's slower queue
//! instead. One noisy tenant is thereby isolated on slow queues instead of
//! starving everybody else on the shared fast queue.
//!
//! Counts are kept in a [fair_tenant_counter::CounterStore]; the router itself
//! holds no mutable state.
//!
//! ```
//! use std::time::Duration;
//! use fair_tenant::{EnqueueRequest, FairTenantRouter, JobType, Tier};
//! use fair_tenant_counter::MemoryCounterStore;
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let job_type = JobType::builder("ImportJob")
//!         .queue("imports")
//!         .tier(Tier::new("imports_slow", 1, Duration::from_secs(60 * 60))?)
//!         .tenant_argument(0)
//!         .build()?;
//!     let router = FairTenantRouter::new(MemoryCounterStore::default());
//!     let request = EnqueueRequest::new(vec![serde_json::json!("acme")]);
//!
//!     assert_eq!(router.route_request(&job_type, &request).await?, "imports");
//!     assert_eq!(router.route_request(&job_type, &request).await?, "imports_slow");
//!     Ok(())
//! }
//! ```

#[macro_use]
extern crate tracing as extern_tracing;

mod config;
mod context;
mod error;
mod job_type;
mod names;
mod registry;
mod router;
mod slot;
mod tenant;
mod tier;

#[cfg(not(target_arch = "wasm32"))]
pub mod tracing;

pub use config::*;
pub use context::*;
pub use error::*;
pub use job_type::*;
pub use names::*;
pub use registry::*;
pub use router::*;
pub use slot::*;
pub use tenant::*;
pub use tier::*;

pub use fair_tenant_counter as counter;
