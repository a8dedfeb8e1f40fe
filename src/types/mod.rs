//! Wire types for the task endpoints.
//!
//! These mirror the protobuf JSON mapping spoken by TES servers: camelCase
//! field names, enums as upper-case names, default values omitted.

pub mod params;
pub mod state;
pub mod task;
pub mod validate;
pub mod view;

pub use params::*;
pub use state::State;
pub use task::*;
pub use validate::ValidationError;
pub use view::TaskView;

use serde::Deserialize;

/// Decoding helper for protobuf enums, which may arrive as their name or as
/// their number.
#[doc(hidden)]
#[derive(Deserialize)]
#[serde(untagged)]
pub enum EnumRepr {
    Name(String),
    Number(i64),
}
