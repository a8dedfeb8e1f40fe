//! JSON encoding with explicit formatting options.
//!
//! Formatting is chosen per call through [`MarshalOptions`] rather than a
//! process-wide marshaler, so a pretty-printing caller cannot change what
//! the client puts on the wire.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::task::Task;

/// Formatting options for [`MarshalOptions::encode`].
///
/// # Examples
///
/// ```
/// use tes_client::shared::codec::MarshalOptions;
/// use tes_client::{State, Task};
///
/// let task = Task { id: "t1".into(), state: State::Queued, ..Task::default() };
///
/// let compact = MarshalOptions::compact().encode(&task).unwrap();
/// assert_eq!(compact, r#"{"id":"t1","state":"QUEUED"}"#);
///
/// let pretty = MarshalOptions::indented("  ").encode(&task).unwrap();
/// assert_eq!(pretty, "{\n  \"id\": \"t1\",\n  \"state\": \"QUEUED\"\n}");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarshalOptions {
    indent: Option<String>,
}

impl MarshalOptions {
    /// Single-line output with no insignificant whitespace.
    pub fn compact() -> Self {
        Self { indent: None }
    }

    /// Multi-line output indented by `indent` per nesting level.
    pub fn indented(indent: impl Into<String>) -> Self {
        Self {
            indent: Some(indent.into()),
        }
    }

    /// The configured indent, if any.
    pub fn indent(&self) -> Option<&str> {
        self.indent.as_deref()
    }

    /// Encode `value` to a JSON string.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let bytes = self.encode_to_vec(value)?;
        String::from_utf8(bytes).map_err(|e| Error::Encode(e.to_string()))
    }

    /// Encode `value` to JSON bytes.
    pub fn encode_to_vec<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        match &self.indent {
            None => serde_json::to_vec(value).map_err(|e| Error::Encode(e.to_string())),
            Some(indent) => {
                let mut out = Vec::new();
                let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
                let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
                value
                    .serialize(&mut ser)
                    .map_err(|e| Error::Encode(e.to_string()))?;
                Ok(out)
            },
        }
    }

    /// Decode a JSON document. Formatting options do not affect decoding.
    pub fn decode<T: DeserializeOwned>(&self, input: &[u8]) -> Result<T> {
        serde_json::from_slice(input).map_err(|e| Error::Decode(e.to_string()))
    }
}

/// Encode a task as indented JSON (two-space indent), the format used for
/// human-facing output.
pub fn marshal_task(task: &Task) -> Result<String> {
    MarshalOptions::indented("  ").encode(task)
}
