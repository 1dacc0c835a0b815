//! Record shapes for file- and record-oriented storage backends.
//!
//! A workspace is stored as its [`Workspace`](crate::Workspace) record. Items
//! are stored as the records below, with the parent link carried by the
//! storage location rather than by a field.

mod record;

pub use record::{CURRENT_SCHEMA_VERSION, FolderRecord, RequestRecord};
