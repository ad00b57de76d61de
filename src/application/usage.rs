use std::sync::Arc;

use tracing::warn;

use crate::domain::usage::{instance_usage, volume_usage};
use crate::domain::{IdentityRef, Instance, InstanceSize, Profile, QuotaKind, Usage, UsageError, Volume};
use crate::ports::CloudApi;

/// Resolves used/total quota units for charts
pub struct UsageService {
    api: Arc<dyn CloudApi>,
}

impl UsageService {
    pub fn new(api: Arc<dyn CloudApi>) -> Self {
        Self { api }
    }

    /// Fetch usage of one kind for an identity.
    ///
    /// The quota is fetched first; resource listings are only requested once
    /// it is known, and a failure stops the chain.
    pub async fn fetch(&self, identity: &IdentityRef, kind: QuotaKind) -> Result<Usage, UsageError> {
        let detail = self.api.get_identity(identity).await.map_err(|e| {
            warn!("Quota fetch for {} ({}) failed: {}", identity, kind, e);
            UsageError::Quota(kind)
        })?;

        let total = detail.quota.total_for(kind);
        if !(total > 0.0) {
            return Err(UsageError::Degenerate(kind));
        }

        if kind.is_instance_backed() {
            let instances = self.api.list_instances(identity).await.map_err(|e| {
                warn!("Instance listing for {} failed: {}", identity, e);
                UsageError::Instances(kind)
            })?;

            let sizes = self.api.list_sizes(identity).await.map_err(|e| {
                warn!("Size listing for {} failed: {}", identity, e);
                UsageError::Sizes(kind)
            })?;

            let (used, unresolved) = instance_usage(kind, &instances, &sizes);
            Ok(Usage { used, total, unresolved })
        } else {
            let volumes = self.api.list_volumes(identity).await.map_err(|e| {
                warn!("Volume listing for {} failed: {}", identity, e);
                UsageError::Volumes(kind)
            })?;

            Ok(Usage::new(volume_usage(kind, &volumes), total))
        }
    }
}

/// Usage of the selected identity computed from already loaded collections
pub fn local_usage(
    kind: QuotaKind,
    profile: Option<&Profile>,
    instances: &[Instance],
    volumes: &[Volume],
    sizes: &[InstanceSize],
) -> Result<Usage, UsageError> {
    let total = profile.ok_or(UsageError::Quota(kind))?.quota.total_for(kind);
    if !(total > 0.0) {
        return Err(UsageError::Degenerate(kind));
    }

    if !kind.is_instance_backed() {
        return Ok(Usage::new(volume_usage(kind, volumes), total));
    }

    // Sizes failed to load; the instances cannot be weighed
    if sizes.is_empty() && instances.iter().any(|i| i.is_active()) {
        return Err(UsageError::NoSizes(kind));
    }

    let (used, unresolved) = instance_usage(kind, instances, sizes);
    Ok(Usage { used, total, unresolved })
}
