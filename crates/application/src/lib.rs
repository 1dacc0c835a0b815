//! Relay Application - Use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for persistence, transport, time and files)
//! - The collection store orchestrating workspaces and items
//! - Variable resolution and request execution

pub mod error;
pub mod ports;
pub mod store;
pub mod use_cases;
pub mod variable_resolver;

pub use error::{StoreError, StoreResult};
pub use ports::{
    CancellationReceiver, CancellationToken, Clock, HttpClient, PersistenceAdapter,
    PersistenceError, PersistenceResult, TransportError, TransportResponse,
};
pub use store::{CollectionStore, StoreEvent, StoreSnapshot, SubscriptionId, WorkspaceSwitch};
pub use use_cases::{ExecuteRequest, prepare_request};
pub use variable_resolver::{ResolutionResult, VariableResolver, substitute, substitute_value};
