use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{IdentityRef, Instance, Profile, Volume};
use crate::ports::{CloudApi, CollectionStore};

use super::Collections;

/// Keeps the selected identity's collections in step with the cloud API
pub struct StoreSync {
    api: Arc<dyn CloudApi>,
    identity: IdentityRef,
    collections: Collections,
}

impl StoreSync {
    pub fn new(api: Arc<dyn CloudApi>, identity: IdentityRef, collections: Collections) -> Self {
        Self {
            api,
            identity,
            collections,
        }
    }

    /// Reload every collection once. Each collection fails on its own.
    pub async fn sync_once(&self) {
        let (detail, instances, volumes, sizes) = tokio::join!(
            self.api.get_identity(&self.identity),
            self.api.list_instances(&self.identity),
            self.api.list_volumes(&self.identity),
            self.api.list_sizes(&self.identity),
        );

        match detail {
            Ok(detail) => {
                let profile = Profile::new(self.identity.clone(), detail.quota);
                if self.collections.profile.snapshot().first() != Some(&profile) {
                    self.collections.profile.reset(vec![profile]);
                }
            }
            Err(e) => {
                warn!("Profile sync for {} failed: {}", self.identity, e);
                self.collections.profile.fail(e.to_string());
            }
        }

        match instances {
            Ok(instances) => reconcile(self.collections.instances.as_ref(), instances, instance_key),
            Err(e) => {
                warn!("Instance sync for {} failed: {}", self.identity, e);
                self.collections.instances.fail(e.to_string());
            }
        }

        match volumes {
            Ok(volumes) => reconcile(self.collections.volumes.as_ref(), volumes, volume_key),
            Err(e) => {
                warn!("Volume sync for {} failed: {}", self.identity, e);
                self.collections.volumes.fail(e.to_string());
            }
        }

        match sizes {
            Ok(sizes) => {
                if self.collections.sizes.snapshot() != sizes {
                    self.collections.sizes.reset(sizes);
                }
            }
            Err(e) => {
                warn!("Size sync for {} failed: {}", self.identity, e);
                self.collections.sizes.fail(e.to_string());
            }
        }
    }

    /// Sync forever at a fixed interval
    pub async fn run(self, interval: Duration) {
        info!("Syncing {} every {:?}", self.identity, interval);
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            self.sync_once().await;
            debug!("Synced collections of {}", self.identity);
        }
    }
}

fn instance_key(instance: &Instance) -> String {
    instance.id.clone().unwrap_or_else(|| instance.name.clone())
}

fn volume_key(volume: &Volume) -> String {
    volume.id.clone()
}

/// Apply the difference between the store and `fresh` as add, remove and
/// change events. An empty store is filled with a single reset.
pub fn reconcile<T, K>(store: &dyn CollectionStore<T>, fresh: Vec<T>, key: fn(&T) -> K)
where
    T: Clone + PartialEq,
    K: PartialEq,
{
    let current = store.snapshot();
    if current.is_empty() {
        if !fresh.is_empty() {
            store.reset(fresh);
        }
        return;
    }

    store.remove_where(&|item: &T| !fresh.iter().any(|f| key(f) == key(item)));

    for item in fresh {
        match current.iter().find(|existing| key(existing) == key(&item)) {
            Some(existing) if *existing != item => {
                let k = key(&item);
                store.update_where(&|candidate: &T| key(candidate) == k, item);
            }
            Some(_) => {}
            None => store.add(item),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::adapters::MemoryStore;
    use crate::application::usage::tests::FakeApi;
    use crate::domain::InstanceSize;
    use crate::ports::StoreEvent;

    fn collections() -> Collections {
        Collections {
            profile: Arc::new(MemoryStore::<Profile>::new()),
            instances: Arc::new(MemoryStore::<Instance>::new()),
            volumes: Arc::new(MemoryStore::<Volume>::new()),
            sizes: Arc::new(MemoryStore::<InstanceSize>::new()),
        }
    }

    #[test]
    fn test_reconcile_emits_minimal_events() {
        let store = MemoryStore::with_items(vec![
            Volume::new("a", 10.0, "available"),
            Volume::new("b", 20.0, "available"),
        ]);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(Arc::new(move |event: &StoreEvent<Volume>| {
            sink.lock().unwrap().push(event.clone());
        }));

        reconcile(
            &store,
            vec![
                Volume::new("b", 20.0, "in-use"),
                Volume::new("c", 5.0, "available"),
            ],
            volume_key,
        );

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                StoreEvent::Remove(Volume::new("a", 10.0, "available")),
                StoreEvent::Change(Volume::new("b", 20.0, "in-use")),
                StoreEvent::Add(Volume::new("c", 5.0, "available")),
            ]
        );
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_sync_fills_collections() {
        let collections = collections();
        let sync = StoreSync::new(Arc::new(FakeApi::healthy()), IdentityRef::new("1", "7"), collections.clone());

        sync.sync_once().await;

        assert_eq!(collections.profile.len(), 1);
        assert_eq!(collections.instances.len(), 3);
        assert_eq!(collections.volumes.len(), 2);
        assert_eq!(collections.sizes.len(), 2);
    }

    #[tokio::test]
    async fn test_sync_failure_keeps_previous_items() {
        let collections = collections();
        collections.volumes.reset(vec![Volume::new("old", 1.0, "available")]);
        let sync = StoreSync::new(
            Arc::new(FakeApi {
                volumes: None,
                ..FakeApi::healthy()
            }),
            IdentityRef::new("1", "7"),
            collections.clone(),
        );

        sync.sync_once().await;

        assert_eq!(collections.volumes.snapshot(), vec![Volume::new("old", 1.0, "available")]);
        assert_eq!(collections.instances.len(), 3);
    }
}
