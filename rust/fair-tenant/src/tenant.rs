use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::TenantId;

/// Derives the tenant that owns a job from the job's arguments.
///
/// Resolvers should be pure: the same arguments must always resolve to the
/// same tenant. Any closure of the shape `Fn(&[Value]) -> Result<TenantId>`
/// is a resolver.
pub trait TenantResolver: Send + Sync {
    fn resolve(&self, arguments: &[Value]) -> Result<TenantId>;
}

impl<F> TenantResolver for F
where
    F: Fn(&[Value]) -> Result<TenantId> + Send + Sync,
{
    fn resolve(&self, arguments: &[Value]) -> Result<TenantId> {
        self(arguments)
    }
}

/// Uses one positional job argument as the tenant. Strings are used as they
/// are and numbers by their decimal representation; anything else fails to
/// resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgumentTenantResolver {
    index: usize,
}

impl ArgumentTenantResolver {
    pub fn new(index: usize) -> Self {
        ArgumentTenantResolver { index }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl TenantResolver for ArgumentTenantResolver {
    fn resolve(&self, arguments: &[Value]) -> Result<TenantId> {
        match arguments.get(self.index) {
            Some(Value::String(tenant)) if !tenant.trim().is_empty() => {
                Ok(TenantId::from(tenant.as_str()))
            }
            Some(Value::Number(tenant)) => Ok(TenantId::from(tenant.to_string())),
            Some(other) => Err(anyhow!(
                "Argument {} cannot be used as a tenant: {}",
                self.index,
                other
            )),
            None => Err(anyhow!("Job has no argument at position {}", self.index)),
        }
    }
}
