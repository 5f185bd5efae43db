use fair_tenant_counter::{BucketKey, CounterStore};

use crate::{
    ActiveSlot, EnqueueRequest, FairTenantError, JobType, QueueName, RoutingContext, TenantId,
    Tier,
};

/// Prefix of every counter key written by a [FairTenantRouter] unless another
/// namespace is configured
pub const DEFAULT_NAMESPACE: &str = "fair-tenant";

/// Decides which queue a job is pushed to, demoting tenants that submit more
/// than their configured share of jobs to slower queues.
///
/// The router holds no mutable state of its own; all counts live in the
/// [CounterStore], so a router can be cloned freely and called concurrently
/// from any number of submitters.
#[derive(Clone, Debug)]
pub struct FairTenantRouter<S>
where
    S: CounterStore,
{
    store: S,
    namespace: String,
}

impl<S> FairTenantRouter<S>
where
    S: CounterStore,
{
    pub fn new(store: S) -> Self {
        FairTenantRouter {
            store,
            namespace: DEFAULT_NAMESPACE.to_owned(),
        }
    }

    /// Scope all counter keys written by this router to `namespace`
    pub fn with_namespace<N>(mut self, namespace: N) -> Self
    where
        N: Into<String>,
    {
        self.namespace = namespace.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Route a job as submitted by the enqueue pipeline. The tenant is taken
    /// from the request if set explicitly (a blank tenant counts as unset),
    /// otherwise from the job type's tenant resolver. Nothing is resolved for
    /// job types without tiers, nor for jobs explicitly sent to an unmanaged
    /// queue, since neither is ever counted.
    pub async fn route_request(
        &self,
        job_type: &JobType,
        request: &EnqueueRequest,
    ) -> Result<QueueName, FairTenantError> {
        let context = RoutingContext::new(job_type, request.queue.as_ref(), None);

        if !job_type.is_throttled() || context.is_unmanaged_override() {
            return self.route(&context).await;
        }

        let tenant = match request.tenant.as_ref().filter(|tenant| !tenant.is_empty()) {
            Some(tenant) => Some(tenant.clone()),
            None => job_type.resolve_tenant(&request.arguments)?,
        };

        self.route(&context.with_tenant(tenant)).await
    }

    /// Decide on the destination queue for one job and record the job against
    /// every tier that applies to it.
    ///
    /// Applicable tiers are evaluated from most to least severe (shortest
    /// window first, configuration order for equal windows). Each of them
    /// counts the job, whether or not an earlier tier already fired, so wider
    /// windows keep accumulating while narrower ones are in effect. The first
    /// tier that fires decides the queue. If none fires, the requested queue
    /// is returned unchanged.
    ///
    /// Should the counter store fail part way through, tiers evaluated before
    /// the failure keep their increment. This only ever under-counts the
    /// remaining tiers for this one job.
    pub async fn route(
        &self,
        context: &RoutingContext<'_>,
    ) -> Result<QueueName, FairTenantError> {
        let job_type = context.job_type();
        let requested_queue = context.requested_queue();

        if !job_type.is_throttled() {
            return Ok(requested_queue.clone());
        }

        let Some(tenant) = context.tenant() else {
            trace!("No tenant for {}, leaving it on {}", job_type.name(), requested_queue);
            return Ok(requested_queue.clone());
        };

        if context.is_unmanaged_override() {
            debug!(
                "{} for {} was explicitly sent to unmanaged queue {}",
                job_type.name(),
                tenant,
                requested_queue
            );
            return Ok(requested_queue.clone());
        }

        let slot = context
            .slotted_queues()
            .resolve(context.declared_queue(), requested_queue);

        let mut destination: Option<&QueueName> = None;

        for (index, tier) in job_type.tiers_by_severity() {
            if !tier.applies_to(&slot) {
                continue;
            }

            let key = self.bucket_key(job_type, tenant, &slot, index, tier);
            let count = match self.store.record_event(&key, tier.window()).await {
                Ok(count) => count,
                Err(error) => {
                    warn!(
                        "Could not count {} for {} against tier {}: {}",
                        job_type.name(),
                        tenant,
                        index,
                        error
                    );
                    return Err(error.into());
                }
            };

            trace!(
                "{} for {} in {}: {}/{} within {:?} for tier {}",
                job_type.name(),
                tenant,
                slot,
                count,
                tier.threshold(),
                tier.window(),
                index
            );

            if destination.is_none() && tier.fires_at(count) {
                destination = Some(tier.target_queue());
            }
        }

        match destination {
            Some(queue) => {
                debug!(
                    "Rerouting {} for {} from {} to {}",
                    job_type.name(),
                    tenant,
                    requested_queue,
                    queue
                );
                Ok(queue.clone())
            }
            None => Ok(requested_queue.clone()),
        }
    }

    fn bucket_key(
        &self,
        job_type: &JobType,
        tenant: &TenantId,
        slot: &ActiveSlot,
        index: usize,
        tier: &Tier,
    ) -> BucketKey {
        BucketKey::compose(
            &self.namespace,
            &[
                job_type.name().to_owned(),
                tenant.to_string(),
                slot.to_string(),
                index.to_string(),
                tier.window().as_millis().to_string(),
            ],
        )
    }
}
