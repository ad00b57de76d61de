use std::sync::Arc;

/// Change notification emitted by a collection store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent<T> {
    Add(T),
    Remove(T),
    Change(T),
    Reset(Vec<T>),
    /// Loading the collection failed
    Fail(String),
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

pub type Handler<T> = Arc<dyn Fn(&StoreEvent<T>) + Send + Sync>;

/// Port for an observable in-memory collection
pub trait CollectionStore<T>: Send + Sync {
    /// Copy of the current items
    fn snapshot(&self) -> Vec<T>;

    /// Replace every item and emit `Reset`
    fn reset(&self, items: Vec<T>);

    /// Append an item and emit `Add`
    fn add(&self, item: T);

    /// Remove the items matching `predicate`, emitting `Remove` for each
    fn remove_where(&self, predicate: &dyn Fn(&T) -> bool) -> usize;

    /// Replace the first item matching `predicate` and emit `Change`
    fn update_where(&self, predicate: &dyn Fn(&T) -> bool, item: T) -> bool;

    /// Emit `Fail` without touching the items
    fn fail(&self, reason: String);

    fn subscribe(&self, handler: Handler<T>) -> SubscriptionId;

    /// Returns false when the id was not subscribed
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    fn len(&self) -> usize {
        self.snapshot().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
