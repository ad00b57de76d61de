use async_trait::async_trait;

use crate::domain::{Group, IdentityDetail, IdentityRef, Instance, InstanceSize, Volume};

/// Port for the read-only cloud management REST API
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Get the identity, including its quota block
    async fn get_identity(
        &self,
        identity: &IdentityRef,
    ) -> Result<IdentityDetail, Box<dyn std::error::Error + Send + Sync>>;

    /// List the volumes owned by an identity
    async fn list_volumes(&self, identity: &IdentityRef) -> Result<Vec<Volume>, Box<dyn std::error::Error + Send + Sync>>;

    /// List the instances owned by an identity (all states)
    async fn list_instances(
        &self,
        identity: &IdentityRef,
    ) -> Result<Vec<Instance>, Box<dyn std::error::Error + Send + Sync>>;

    /// List the instance sizes available to an identity
    async fn list_sizes(
        &self,
        identity: &IdentityRef,
    ) -> Result<Vec<InstanceSize>, Box<dyn std::error::Error + Send + Sync>>;

    /// List the groups of the current user
    async fn list_groups(&self) -> Result<Vec<Group>, Box<dyn std::error::Error + Send + Sync>>;
}
