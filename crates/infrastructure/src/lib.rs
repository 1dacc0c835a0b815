//! Relay Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer: the reqwest transport, the system
//! clock, and the disk, embedded key-value and remote storage backends.

pub mod adapters;
pub mod persistence;
pub mod serialization;

pub use adapters::{DEFAULT_TIMEOUT, ReqwestHttpClient, SystemClock};
pub use persistence::{DiskAdapter, KvAdapter, RemoteAdapter, TokioFileSystem, slugify};
pub use serialization::{
    SerializationError, from_json, from_json_bytes, to_json_compact_bytes, to_json_stable,
};
