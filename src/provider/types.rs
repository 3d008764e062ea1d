use async_trait::async_trait;

use crate::error::Result;
use crate::record::Resource;

/// Storage the reconciler reads and mutates. Implementations own transport,
/// authentication and any retry policy.
#[async_trait]
pub trait ResourceBackend: Send + Sync {
    /// All resources of the zone, in the backend's order.
    async fn list(&self, zone: &str) -> Result<Vec<Resource>>;

    /// Creates a resource. The returned resource carries the new identifier.
    async fn create(&self, zone: &str, resource: &Resource) -> Result<Resource>;

    /// Replaces the payload of the resource `id`, keeping its identifier.
    async fn update(&self, zone: &str, id: &str, resource: &Resource) -> Result<Resource>;

    async fn delete(&self, zone: &str, id: &str) -> Result<()>;
}

#[async_trait]
impl<B> ResourceBackend for std::sync::Arc<B>
where
    B: ResourceBackend + ?Sized,
{
    async fn list(&self, zone: &str) -> Result<Vec<Resource>> {
        (**self).list(zone).await
    }

    async fn create(&self, zone: &str, resource: &Resource) -> Result<Resource> {
        (**self).create(zone, resource).await
    }

    async fn update(&self, zone: &str, id: &str, resource: &Resource) -> Result<Resource> {
        (**self).update(zone, id, resource).await
    }

    async fn delete(&self, zone: &str, id: &str) -> Result<()> {
        (**self).delete(zone, id).await
    }
}
