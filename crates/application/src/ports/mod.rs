//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod file_system;
mod http_client;
mod persistence;

pub use clock::{Clock, FixedClock};
pub use file_system::{FileSystem, FileSystemError};
pub use http_client::{
    CancellationReceiver, CancellationToken, HttpClient, TransportError, TransportResponse,
};
pub use persistence::{PersistenceAdapter, PersistenceError, PersistenceResult};
