//! Application use cases (business logic orchestration).

mod execute_request;

pub use execute_request::{ExecuteRequest, prepare_request};
