//! Bytes ⇄ [`Document`]. The only place that touches JSON syntax.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// An untyped, decoded document: a JSON object.
pub type Document = Map<String, JsonValue>;

/// Errors returned by [`decode`] and [`encode`].
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed JSON at line {line}, column {column}: {source}")]
    Syntax {
        line: usize,
        column: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("top-level JSON value must be an object, got {0}")]
    NotAnObject(&'static str),

    #[error("document could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decode raw bytes into a [`Document`].
pub fn decode(bytes: &[u8]) -> Result<Document, CodecError> {
    let value: JsonValue = serde_json::from_slice(bytes).map_err(|e| CodecError::Syntax {
        line: e.line(),
        column: e.column(),
        source: e,
    })?;
    match value {
        JsonValue::Object(doc) => Ok(doc),
        other => Err(CodecError::NotAnObject(json_kind(&other))),
    }
}

/// Encode a [`Document`] as compact JSON.
pub fn encode(doc: &Document) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(doc).map_err(CodecError::Encode)
}

/// Encode a [`Document`] as indented JSON.
pub fn encode_pretty(doc: &Document) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec_pretty(doc).map_err(CodecError::Encode)
}

pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
