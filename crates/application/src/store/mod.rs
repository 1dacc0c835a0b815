//! Collection store: the stateful core holding workspaces, the active
//! workspace's items and the observer list.

mod collection_store;
mod events;
mod snapshot;


pub use collection_store::{CollectionStore, WorkspaceSwitch};
pub use events::{StoreEvent, SubscriptionId};
pub use snapshot::StoreSnapshot;
