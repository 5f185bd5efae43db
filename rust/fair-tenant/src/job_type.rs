use std::{fmt::Debug, sync::Arc};

use serde_json::Value;

use crate::{
    ArgumentTenantResolver, ConfigurationError, FairTenantError, QueueName, SlotMap, SlotName,
    TenantId, TenantResolver, Tier,
};

/// The fair-tenant configuration of one job type, validated at registration
/// and read-only afterwards. Cloning is cheap and shares the configuration.
#[derive(Clone)]
pub struct JobType {
    name: String,
    queue: QueueName,
    tiers: Arc<[Tier]>,
    severity: Arc<[usize]>,
    slots: Arc<SlotMap>,
    tenant_resolver: Option<Arc<dyn TenantResolver>>,
    default_tenant: Option<TenantId>,
}

impl JobType {
    pub fn builder<N>(name: N) -> JobTypeBuilder
    where
        N: Into<String>,
    {
        JobTypeBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The queue this job type is statically configured to use
    pub fn queue(&self) -> &QueueName {
        &self.queue
    }

    /// Tiers in the order they were configured
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Tiers from most to least severe, each paired with its position in the
    /// configuration. Shorter windows are more severe; tiers with equal
    /// windows keep their configured order.
    pub fn tiers_by_severity(&self) -> impl Iterator<Item = (usize, &Tier)> + '_ {
        self.severity
            .iter()
            .map(move |&index| (index, &self.tiers[index]))
    }

    pub fn slots(&self) -> &SlotMap {
        &self.slots
    }

    /// Whether any tier is configured; job types without tiers are never
    /// rerouted and never touch the counter store.
    pub fn is_throttled(&self) -> bool {
        !self.tiers.is_empty()
    }

    pub fn default_tenant(&self) -> Option<&TenantId> {
        self.default_tenant.as_ref()
    }

    pub fn has_tenant_resolver(&self) -> bool {
        self.tenant_resolver.is_some()
    }

    /// Resolve the tenant owning a job from its arguments. Returns `None` when
    /// the job type has no resolver. When the resolver fails, the declared
    /// default tenant is used if there is one.
    pub fn resolve_tenant(&self, arguments: &[Value]) -> Result<Option<TenantId>, FairTenantError> {
        let Some(resolver) = &self.tenant_resolver else {
            return Ok(None);
        };

        match resolver.resolve(arguments) {
            Ok(tenant) => Ok(Some(tenant)),
            Err(error) => match &self.default_tenant {
                Some(tenant) => {
                    debug!(
                        "Using default tenant '{}' for {}: {}",
                        tenant, self.name, error
                    );
                    Ok(Some(tenant.clone()))
                }
                None => Err(FairTenantError::TenantResolution {
                    job_type: self.name.clone(),
                    source: error,
                }),
            },
        }
    }
}

impl Debug for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobType")
            .field("name", &self.name)
            .field("queue", &self.queue)
            .field("tiers", &self.tiers)
            .field("slots", &self.slots)
            .field("tenant_resolver", &self.tenant_resolver.is_some())
            .field("default_tenant", &self.default_tenant)
            .finish()
    }
}

/// [JobTypeBuilder] assembles and validates a [JobType]. A queue must be
/// provided; everything else is optional.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use fair_tenant::{JobType, Tier};
///
/// let job_type = JobType::builder("ReportJob")
///     .queue("reports")
///     .slotted_queue("reports_a")
///     .tier(Tier::new("reports_slow", 100, Duration::from_secs(60 * 60)).unwrap())
///     .tier(
///         Tier::new("reports_a_slow", 10, Duration::from_secs(60))
///             .unwrap()
///             .with_slots(["reports_a"]),
///     )
///     .tenant_argument(0)
///     .build()
///     .unwrap();
///
/// assert_eq!(job_type.tiers_by_severity().next().unwrap().0, 1);
/// ```
pub struct JobTypeBuilder {
    name: String,
    queue: Option<QueueName>,
    tiers: Vec<Tier>,
    slots: Vec<(SlotName, Vec<QueueName>)>,
    tenant_resolver: Option<Arc<dyn TenantResolver>>,
    default_tenant: Option<TenantId>,
}

impl JobTypeBuilder {
    pub fn new<N>(name: N) -> Self
    where
        N: Into<String>,
    {
        JobTypeBuilder {
            name: name.into(),
            queue: None,
            tiers: Vec::new(),
            slots: Vec::new(),
            tenant_resolver: None,
            default_tenant: None,
        }
    }

    /// The queue jobs of this type are enqueued to unless rerouted.
    pub fn queue<Q>(mut self, queue: Q) -> Self
    where
        Q: Into<QueueName>,
    {
        self.queue = Some(queue.into());
        self
    }

    /// Append a tier. The order tiers are added in breaks ties between tiers
    /// that share a window.
    pub fn tier(mut self, tier: Tier) -> Self {
        self.tiers.push(tier);
        self
    }

    pub fn tiers<I>(mut self, tiers: I) -> Self
    where
        I: IntoIterator<Item = Tier>,
    {
        self.tiers.extend(tiers);
        self
    }

    /// Declare a queue that forms a slot of its own, named after the queue.
    pub fn slotted_queue<Q>(self, queue: Q) -> Self
    where
        Q: Into<QueueName>,
    {
        let queue = queue.into();
        let name = SlotName::from(queue.as_str());
        self.slot(name, [queue])
    }

    /// Declare a named slot made up of one or more queues that share
    /// counters.
    pub fn slot<N, I, Q>(mut self, name: N, queues: I) -> Self
    where
        N: Into<SlotName>,
        I: IntoIterator<Item = Q>,
        Q: Into<QueueName>,
    {
        self.slots
            .push((name.into(), queues.into_iter().map(Into::into).collect()));
        self
    }

    pub fn tenant_resolver<R>(mut self, resolver: R) -> Self
    where
        R: TenantResolver + 'static,
    {
        self.tenant_resolver = Some(Arc::new(resolver));
        self
    }

    /// Use the job argument at `index` as the tenant.
    pub fn tenant_argument(self, index: usize) -> Self {
        self.tenant_resolver(ArgumentTenantResolver::new(index))
    }

    /// The tenant to fall back to when the resolver fails for a job.
    pub fn default_tenant<T>(mut self, tenant: T) -> Self
    where
        T: Into<TenantId>,
    {
        self.default_tenant = Some(tenant.into());
        self
    }

    /// Validate the configuration and build a [JobType].
    pub fn build(self) -> Result<JobType, ConfigurationError> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::EmptyJobName);
        }

        let queue = self
            .queue
            .ok_or_else(|| ConfigurationError::MissingQueue(self.name.clone()))?;
        if queue.is_empty() {
            return Err(ConfigurationError::EmptyName);
        }

        if let Some(tenant) = &self.default_tenant {
            if tenant.is_empty() {
                return Err(ConfigurationError::EmptyName);
            }
        }

        let mut slots = SlotMap::default();
        for (slot, queues) in self.slots {
            slots.insert(slot, queues)?;
        }

        for tier in &self.tiers {
            if let Some(slot) = tier.slots().iter().find(|slot| !slots.contains_slot(slot)) {
                return Err(ConfigurationError::UnknownSlot {
                    queue: tier.target_queue().clone(),
                    slot: slot.clone(),
                });
            }
        }

        // Stable, so equal windows keep their configured order
        let mut severity: Vec<usize> = (0..self.tiers.len()).collect();
        severity.sort_by_key(|&index| self.tiers[index].window());

        Ok(JobType {
            name: self.name,
            queue,
            tiers: self.tiers.into(),
            severity: severity.into(),
            slots: Arc::new(slots),
            tenant_resolver: self.tenant_resolver,
            default_tenant: self.default_tenant,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::anyhow;
    use serde_json::json;

    use crate::{ConfigurationError, FairTenantError, JobType, SlotName, TenantId, Tier};

    const HOUR: Duration = Duration::from_secs(60 * 60);
    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn it_orders_tiers_by_window_then_configuration_order() {
        let job_type = JobType::builder("SomeJob")
            .queue("fast")
            .tier(Tier::new("day", 1, DAY).unwrap())
            .tier(Tier::new("hour_first", 1, HOUR).unwrap())
            .tier(Tier::new("hour_second", 1, HOUR).unwrap())
            .build()
            .unwrap();

        let order: Vec<&str> = job_type
            .tiers_by_severity()
            .map(|(_, tier)| tier.target_queue().as_str())
            .collect();

        assert_eq!(order, vec!["hour_first", "hour_second", "day"]);
        assert_eq!(
            job_type
                .tiers_by_severity()
                .map(|(index, _)| index)
                .collect::<Vec<_>>(),
            vec![1, 2, 0]
        );
    }

    #[test]
    fn it_requires_a_queue() {
        let result = JobType::builder("SomeJob").build();
        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::MissingQueue("SomeJob".into())
        );
    }

    #[test]
    fn it_rejects_tiers_referencing_undeclared_slots() {
        let result = JobType::builder("SomeJob")
            .queue("whatever")
            .slotted_queue("whatever_a")
            .tier(Tier::new("whatever_b_slow", 1, HOUR).unwrap().with_slots(["whatever_b"]))
            .build();

        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::UnknownSlot {
                queue: "whatever_b_slow".into(),
                slot: SlotName::from("whatever_b"),
            }
        );
    }

    #[test]
    fn it_falls_back_to_the_default_tenant() {
        let job_type = JobType::builder("SomeJob")
            .queue("fast")
            .tier(Tier::new("slow", 1, HOUR).unwrap())
            .tenant_argument(0)
            .default_tenant("foo")
            .build()
            .unwrap();

        assert_eq!(
            job_type.resolve_tenant(&[json!("bar")]).unwrap(),
            Some(TenantId::from("bar"))
        );
        assert_eq!(
            job_type.resolve_tenant(&[]).unwrap(),
            Some(TenantId::from("foo"))
        );
    }

    #[test]
    fn it_surfaces_tenant_resolution_failures_without_a_default() {
        let job_type = JobType::builder("SomeJob")
            .queue("fast")
            .tier(Tier::new("slow", 1, HOUR).unwrap())
            .tenant_resolver(|_: &[serde_json::Value]| -> anyhow::Result<TenantId> {
                Err(anyhow!("account id missing"))
            })
            .build()
            .unwrap();

        assert!(matches!(
            job_type.resolve_tenant(&[]),
            Err(FairTenantError::TenantResolution { job_type, .. }) if job_type == "SomeJob"
        ));
    }

    #[test]
    fn it_resolves_no_tenant_without_a_resolver() {
        let job_type = JobType::builder("SomeJob")
            .queue("fast")
            .default_tenant("foo")
            .build()
            .unwrap();

        assert_eq!(job_type.resolve_tenant(&[json!("bar")]).unwrap(), None);
        assert!(!job_type.is_throttled());
    }
}
