use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ports::{CollectionStore, Handler, StoreEvent, SubscriptionId};

/// In-memory observable collection.
///
/// Handlers run synchronously on the mutating thread, after the item lock
/// has been released, so a handler may read the store it observes.
pub struct MemoryStore<T> {
    items: RwLock<Vec<T>>,
    subscribers: RwLock<Vec<(SubscriptionId, Handler<T>)>>,
    next_id: AtomicU64,
}

impl<T: Clone + Send + Sync> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_items(items: Vec<T>) -> Self {
        let store = Self::new();
        *store.write_items() = items;
        store
    }

    fn read_items(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.items.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_items(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.items.write().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: StoreEvent<T>) {
        // Clone the handler list so handlers may (un)subscribe while running
        let handlers: Vec<Handler<T>> = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler(&event);
        }
    }
}

impl<T: Clone + Send + Sync> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> CollectionStore<T> for MemoryStore<T> {
    fn snapshot(&self) -> Vec<T> {
        self.read_items().clone()
    }

    fn reset(&self, items: Vec<T>) {
        *self.write_items() = items.clone();
        self.emit(StoreEvent::Reset(items));
    }

    fn add(&self, item: T) {
        self.write_items().push(item.clone());
        self.emit(StoreEvent::Add(item));
    }

    fn remove_where(&self, predicate: &dyn Fn(&T) -> bool) -> usize {
        let removed: Vec<T> = {
            let mut items = self.write_items();
            let (removed, kept) = items.drain(..).partition(|item| predicate(item));
            *items = kept;
            removed
        };

        let count = removed.len();
        for item in removed {
            self.emit(StoreEvent::Remove(item));
        }
        count
    }

    fn update_where(&self, predicate: &dyn Fn(&T) -> bool, item: T) -> bool {
        let updated = {
            let mut items = self.write_items();
            match items.iter_mut().find(|existing| predicate(existing)) {
                Some(slot) => {
                    *slot = item.clone();
                    true
                }
                None => false,
            }
        };

        if updated {
            self.emit(StoreEvent::Change(item));
        }
        updated
    }

    fn fail(&self, reason: String) {
        self.emit(StoreEvent::Fail(reason));
    }

    fn subscribe(&self, handler: Handler<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, handler));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    fn len(&self) -> usize {
        self.read_items().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<StoreEvent<u32>>>>, Handler<u32>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let handler: Handler<u32> = Arc::new(move |event: &StoreEvent<u32>| {
            sink.lock().unwrap().push(event.clone());
        });
        (events, handler)
    }

    #[test]
    fn test_events_are_typed_and_ordered() {
        let store = MemoryStore::new();
        let (events, handler) = recorder();
        store.subscribe(handler);

        store.reset(vec![1, 2]);
        store.add(3);
        assert_eq!(store.remove_where(&|n| *n == 2), 1);
        assert!(store.update_where(&|n| *n == 3, 30));
        assert!(!store.update_where(&|n| *n == 99, 0));
        store.fail("boom".to_string());

        assert_eq!(store.snapshot(), vec![1, 30]);
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                StoreEvent::Reset(vec![1, 2]),
                StoreEvent::Add(3),
                StoreEvent::Remove(2),
                StoreEvent::Change(30),
                StoreEvent::Fail("boom".to_string()),
            ]
        );
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let store = MemoryStore::new();
        let (events, handler) = recorder();
        let id = store.subscribe(handler);

        store.add(1);
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add(2);

        assert_eq!(*events.lock().unwrap(), vec![StoreEvent::Add(1)]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_handler_can_read_store() {
        let store = Arc::new(MemoryStore::<u32>::new());
        let seen = Arc::new(Mutex::new(0));

        let reader = store.clone();
        let sink = seen.clone();
        store.subscribe(Arc::new(move |_event: &StoreEvent<u32>| {
            *sink.lock().unwrap() = reader.len();
        }));

        store.reset(vec![4, 5, 6]);
        assert_eq!(*seen.lock().unwrap(), 3);
    }
}
