pub mod cloud_api;
pub mod collection_store;

pub use cloud_api::CloudApi;
pub use collection_store::{CollectionStore, Handler, StoreEvent, SubscriptionId};
