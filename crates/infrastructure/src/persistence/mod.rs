//! Storage backends implementing the `PersistenceAdapter` port.

mod disk;
mod file_system;
mod kv;
mod remote;

pub use disk::{DiskAdapter, slugify};
pub use file_system::TokioFileSystem;
pub use kv::KvAdapter;
pub use remote::RemoteAdapter;
