//! HTTP request domain types

mod body;
mod method;
mod pair;
mod prepared;

pub use body::{BodyType, RequestBody};
pub use method::HttpMethod;
pub use pair::{KeyValue, KeyValueList};
pub use prepared::PreparedRequest;
