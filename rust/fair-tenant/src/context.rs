use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{JobType, QueueName, SlotMap, TenantId, Tier};

/// What the enqueue pipeline knows about a job when it asks for a queue. The
/// router only reads it; the queue it decides on is returned separately.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnqueueRequest {
    /// A queue explicitly requested for this job, overriding the job type's
    /// declared queue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueName>,
    /// A tenant explicitly assigned to this job, bypassing the job type's
    /// tenant resolver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantId>,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

impl EnqueueRequest {
    pub fn new(arguments: Vec<Value>) -> Self {
        EnqueueRequest {
            arguments,
            ..Default::default()
        }
    }

    pub fn on_queue<Q>(mut self, queue: Q) -> Self
    where
        Q: Into<QueueName>,
    {
        self.queue = Some(queue.into());
        self
    }

    pub fn for_tenant<T>(mut self, tenant: T) -> Self
    where
        T: Into<TenantId>,
    {
        self.tenant = Some(tenant.into());
        self
    }
}

/// Everything needed to route one job, assembled for a single call and
/// discarded afterwards.
#[derive(Clone, Debug)]
pub struct RoutingContext<'a> {
    job_type: &'a JobType,
    requested_queue: &'a QueueName,
    tenant: Option<TenantId>,
}

impl<'a> RoutingContext<'a> {
    /// When no queue is requested, the job type's declared queue is used.
    pub fn new(
        job_type: &'a JobType,
        requested_queue: Option<&'a QueueName>,
        tenant: Option<TenantId>,
    ) -> Self {
        RoutingContext {
            job_type,
            requested_queue: requested_queue.unwrap_or(job_type.queue()),
            tenant,
        }
    }

    pub fn with_tenant(mut self, tenant: Option<TenantId>) -> Self {
        self.tenant = tenant;
        self
    }

    pub fn job_type(&self) -> &'a JobType {
        self.job_type
    }

    pub fn declared_queue(&self) -> &'a QueueName {
        self.job_type.queue()
    }

    pub fn requested_queue(&self) -> &'a QueueName {
        self.requested_queue
    }

    pub fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    pub fn tiers(&self) -> &'a [Tier] {
        self.job_type.tiers()
    }

    pub fn slotted_queues(&self) -> &'a SlotMap {
        self.job_type.slots()
    }

    /// Whether the job was explicitly sent somewhere other than its declared
    /// queue
    pub fn is_overridden(&self) -> bool {
        self.requested_queue != self.declared_queue()
    }

    /// An override towards a queue outside every slot is an operator's
    /// deliberate choice and is not subject to fair-tenant accounting.
    pub fn is_unmanaged_override(&self) -> bool {
        self.is_overridden() && !self.slotted_queues().contains_queue(self.requested_queue)
    }
}
