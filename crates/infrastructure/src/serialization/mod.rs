//! JSON encoding shared by the persistence backends.
//!
//! Files on disk are pretty-printed with a trailing newline so they diff
//! cleanly; key-value entries are stored compact.

mod json;

pub use json::*;
