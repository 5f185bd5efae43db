use std::{path::Path, time::Duration};

use anyhow::Result;
use fair_tenant_counter::{CounterStore, CounterStoreTimeout};
use serde::{Deserialize, Serialize};

use crate::{
    ConfigurationError, FairTenantRouter, JobRegistry, JobType, Tier, DEFAULT_NAMESPACE,
};

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_owned()
}

fn default_store_timeout_ms() -> u64 {
    500
}

/// Fair-tenant settings for a whole deployment, usually read from a TOML
/// file:
///
/// ```toml
/// namespace = "fair-tenant"
/// store_timeout_ms = 250
///
/// [[jobs]]
/// name = "SampleThrottledSlottedJob"
/// queue = "whatever"
/// tenant_argument = 0
/// slotted_queues = ["whatever_a", "whatever_b"]
///
/// [[jobs.tiers]]
/// queue = "whatever_a_supaslow"
/// threshold = 1
/// per = 3600
/// slots = ["whatever_a"]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FairTenantConfig {
    /// Prefix of every counter key
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Upper bound, in milliseconds, for a single counter store call
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    #[serde(default)]
    pub jobs: Vec<JobTypeConfig>,
}

impl Default for FairTenantConfig {
    fn default() -> Self {
        FairTenantConfig {
            namespace: default_namespace(),
            store_timeout_ms: default_store_timeout_ms(),
            jobs: Vec::new(),
        }
    }
}

/// Configuration of one job type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobTypeConfig {
    pub name: String,
    /// The queue the job type is declared to use
    pub queue: String,
    /// Queues that each form a slot of their own
    #[serde(default)]
    pub slotted_queues: Vec<String>,
    /// Named slots grouping several queues under shared counters
    #[serde(default)]
    pub slots: Vec<SlotConfig>,
    #[serde(default)]
    pub tiers: Vec<TierConfig>,
    /// Position of the job argument holding the tenant
    #[serde(default)]
    pub tenant_argument: Option<usize>,
    /// Tenant used when the tenant argument cannot be resolved
    #[serde(default)]
    pub default_tenant: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotConfig {
    pub name: String,
    pub queues: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierConfig {
    /// Where jobs go once this tier fires
    pub queue: String,
    pub threshold: u64,
    /// Window length in seconds
    pub per: u64,
    #[serde(default)]
    pub slots: Vec<String>,
}

impl FairTenantConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    pub async fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let toml_str = tokio::fs::read_to_string(path.as_ref()).await?;
        FairTenantConfig::from_toml_str(&toml_str)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Validate every configured job type and collect them into a
    /// [JobRegistry].
    pub fn build_registry(&self) -> Result<JobRegistry, ConfigurationError> {
        JobRegistry::new(
            self.jobs
                .iter()
                .map(JobTypeConfig::build)
                .collect::<Result<Vec<_>, _>>()?,
        )
    }

    /// Create a router over `store` that uses the configured namespace and
    /// bounds every store call with the configured timeout.
    pub fn router<S>(
        &self,
        store: S,
    ) -> Result<FairTenantRouter<CounterStoreTimeout<S>>, ConfigurationError>
    where
        S: CounterStore,
    {
        if self.store_timeout_ms == 0 {
            return Err(ConfigurationError::InvalidStoreTimeout);
        }

        Ok(
            FairTenantRouter::new(CounterStoreTimeout::new(store, self.store_timeout()))
                .with_namespace(self.namespace.clone()),
        )
    }
}

impl JobTypeConfig {
    pub fn build(&self) -> Result<JobType, ConfigurationError> {
        let mut builder = JobType::builder(self.name.as_str()).queue(self.queue.as_str());

        for queue in &self.slotted_queues {
            builder = builder.slotted_queue(queue);
        }

        for slot in &self.slots {
            builder = builder.slot(slot.name.as_str(), &slot.queues);
        }

        for tier in &self.tiers {
            builder = builder.tier(tier.build()?);
        }

        if let Some(index) = self.tenant_argument {
            builder = builder.tenant_argument(index);
        }

        if let Some(tenant) = &self.default_tenant {
            builder = builder.default_tenant(tenant);
        }

        builder.build()
    }
}

impl TierConfig {
    pub fn build(&self) -> Result<Tier, ConfigurationError> {
        Ok(
            Tier::new(self.queue.as_str(), self.threshold, Duration::from_secs(self.per))?
                .with_slots(&self.slots),
        )
    }
}
