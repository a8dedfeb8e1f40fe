//! Shared helpers used by the client modules.

pub mod codec;
pub mod endpoint;

pub use codec::{marshal_task, MarshalOptions};
pub use endpoint::normalize_endpoint;
