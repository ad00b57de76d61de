use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::IdentityEntry;
use crate::domain::{IdentityRef, Instance, InstanceRow, QuotaKind, RenderedChart, Volume, VolumeRow};
use crate::ports::{CloudApi, CollectionStore, StoreEvent};

use super::{ChartRegistry, UsageService};

/// Table of an identity summary, or the reason it could not be loaded
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Table<T> {
    Loaded { rows: Vec<T> },
    Failed { message: String },
}

impl<T> Table<T> {
    pub fn rows(&self) -> Option<&[T]> {
        match self {
            Self::Loaded { rows } => Some(rows.as_slice()),
            Self::Failed { .. } => None,
        }
    }
}

/// Everything shown in one identity's accordion panel
#[derive(Debug, Clone, Serialize)]
pub struct IdentitySummary {
    pub identity: IdentityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether this is the selected identity
    pub current: bool,
    pub charts: Vec<RenderedChart>,
    pub instances: Table<InstanceRow>,
    pub volumes: Table<VolumeRow>,
    pub generated_at: DateTime<Utc>,
}

/// Identity offered in the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct IdentityListing {
    pub identity: IdentityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub current: bool,
}

/// Builds and caches identity summaries.
///
/// A cached summary is served until a watched store reports an added,
/// removed or changed item, after which every summary is rebuilt on next
/// request.
pub struct SummaryService {
    api: Arc<dyn CloudApi>,
    usage: Arc<UsageService>,
    charts: Arc<ChartRegistry>,
    selected: Option<IdentityRef>,
    configured: Vec<IdentityEntry>,
    cache: RwLock<HashMap<IdentityRef, Arc<IdentitySummary>>>,
    /// Identities seen in the last listing
    known: RwLock<HashSet<IdentityRef>>,
}

impl SummaryService {
    pub fn new(
        api: Arc<dyn CloudApi>,
        usage: Arc<UsageService>,
        charts: Arc<ChartRegistry>,
        selected: Option<IdentityRef>,
        configured: Vec<IdentityEntry>,
    ) -> Self {
        Self {
            api,
            usage,
            charts,
            selected,
            configured,
            cache: RwLock::new(HashMap::new()),
            known: RwLock::new(HashSet::new()),
        }
    }

    /// Mark summaries stale whenever instances or volumes change
    pub fn watch(
        self: &Arc<Self>,
        instances: &Arc<dyn CollectionStore<Instance>>,
        volumes: &Arc<dyn CollectionStore<Volume>>,
    ) {
        let service = Arc::downgrade(self);
        instances.subscribe(Arc::new(move |event: &StoreEvent<Instance>| {
            if !is_item_event(event) {
                return;
            }
            if let Some(service) = service.upgrade() {
                service.invalidate_all();
            }
        }));

        let service = Arc::downgrade(self);
        volumes.subscribe(Arc::new(move |event: &StoreEvent<Volume>| {
            if !is_item_event(event) {
                return;
            }
            if let Some(service) = service.upgrade() {
                service.invalidate_all();
            }
        }));
    }

    pub fn invalidate_all(&self) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        if !cache.is_empty() {
            debug!("Marking {} identity summaries stale", cache.len());
            cache.clear();
        }
    }

    pub fn is_cached(&self, identity: &IdentityRef) -> bool {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(identity)
    }

    /// Cached summary, or a freshly built one
    pub async fn summary(&self, identity: &IdentityRef) -> Arc<IdentitySummary> {
        let cached = self
            .cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(identity)
            .cloned();
        if let Some(cached) = cached {
            return cached;
        }

        let summary = Arc::new(self.build(identity).await);
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(identity.clone(), summary.clone());
        summary
    }

    async fn build(&self, identity: &IdentityRef) -> IdentitySummary {
        info!("Loading summary for identity {}", identity);

        // Each chart fails on its own; tables load alongside
        let charts = join_all(QuotaKind::ALL.iter().map(|kind| {
            let controller = self.charts.controller(identity, *kind);
            let usage = self.usage.clone();
            async move { controller.refresh_or_current(&usage).await }
        }));
        let (charts, instances, volumes) = tokio::join!(
            charts,
            self.api.list_instances(identity),
            self.api.list_volumes(identity)
        );

        let instances = match instances {
            Ok(instances) => Table::Loaded {
                rows: instances.iter().map(InstanceRow::from).collect(),
            },
            Err(e) => {
                warn!("Could not load instances for {}: {}", identity, e);
                Table::Failed {
                    message: "Could not load instances for this identity.".to_string(),
                }
            }
        };

        let volumes = match volumes {
            Ok(volumes) => Table::Loaded {
                rows: volumes.iter().map(VolumeRow::from).collect(),
            },
            Err(e) => {
                warn!("Could not load volumes for {}: {}", identity, e);
                Table::Failed {
                    message: "Could not load volumes for this identity.".to_string(),
                }
            }
        };

        IdentitySummary {
            identity: identity.clone(),
            name: self.name_of(identity),
            current: self.selected.as_ref() == Some(identity),
            charts,
            instances,
            volumes,
            generated_at: Utc::now(),
        }
    }

    /// Identities from the user's groups, or the configured list when the
    /// group listing is unavailable
    pub async fn identities(&self) -> Vec<IdentityListing> {
        let refs: Vec<(IdentityRef, Option<String>)> = match self.api.list_groups().await {
            Ok(groups) if !groups.is_empty() => groups
                .iter()
                .flat_map(|group| group.identities.iter())
                .map(|identity| (identity.identity_ref(), identity.name.clone()))
                .collect(),
            Ok(_) => self.configured_refs(),
            Err(e) => {
                warn!("Could not load all cloud identities: {}", e);
                self.configured_refs()
            }
        };

        let mut known = HashSet::with_capacity(refs.len());
        let mut listings: Vec<IdentityListing> = Vec::with_capacity(refs.len());
        for (identity, name) in refs {
            if !known.insert(identity.clone()) {
                continue;
            }
            listings.push(IdentityListing {
                current: self.selected.as_ref() == Some(&identity),
                name: name.or_else(|| self.name_of(&identity)),
                identity,
            });
        }
        *self.known.write().unwrap_or_else(|e| e.into_inner()) = known;
        listings
    }

    /// Whether `identity` is the selected one, configured, or offered by the
    /// groups listing. Unknown identities get a fresh listing before being
    /// refused.
    pub async fn is_known(&self, identity: &IdentityRef) -> bool {
        let listed = self
            .known
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(identity);
        if listed
            || self.selected.as_ref() == Some(identity)
            || self.configured.iter().any(|entry| &entry.identity_ref() == identity)
        {
            return true;
        }

        self.identities().await.iter().any(|listing| &listing.identity == identity)
    }

    fn configured_refs(&self) -> Vec<(IdentityRef, Option<String>)> {
        self.configured
            .iter()
            .map(|entry| (entry.identity_ref(), entry.name.clone()))
            .collect()
    }

    fn name_of(&self, identity: &IdentityRef) -> Option<String> {
        self.configured
            .iter()
            .find(|entry| &entry.identity_ref() == identity)
            .and_then(|entry| entry.name.clone())
    }
}

fn is_item_event<T>(event: &StoreEvent<T>) -> bool {
    matches!(event, StoreEvent::Add(_) | StoreEvent::Remove(_) | StoreEvent::Change(_))
}
