//! # Payload decoding.
//!
//! Raw bus payloads are bytes with no declared schema. [`decode`] turns them
//! into a [`DecodedValue`]:
//!
//! - valid UTF-8 that parses as JSON → [`DecodedValue::Structured`]
//! - valid UTF-8 that does not → [`DecodedValue::Text`] (kept verbatim)
//! - invalid UTF-8 → [`DecodedValue::Text`] with a lossy representation
//!
//! Decoding never fails the caller and has no side effects.
//!
//! # Example
//! ```
//! use topiclens::{decode, DecodedValue};
//!
//! let v = decode(br#"{"state":"ON"}"#);
//! assert!(matches!(v, DecodedValue::Structured(_)));
//!
//! let v = decode(b"21.5C ambient");
//! assert!(matches!(v, DecodedValue::Text(_)));
//! ```

use serde::Serialize;
use serde_json::Value;

/// A decoded bus payload: either parsed JSON or a plain string.
///
/// The tagged split lets diff and serialization logic pattern-match
/// exhaustively instead of sniffing shapes at use sites.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecodedValue {
    /// Payload was not valid JSON; the (possibly lossy) text is kept verbatim.
    Text(String),
    /// Payload parsed as a JSON document (object, array, or scalar).
    Structured(Value),
}

impl DecodedValue {
    /// Renders the value as JSON for output and cache comparison.
    ///
    /// `Text` becomes a JSON string; `Structured` is returned as-is.
    pub fn to_json(&self) -> Value {
        match self {
            DecodedValue::Text(s) => Value::String(s.clone()),
            DecodedValue::Structured(v) => v.clone(),
        }
    }

    /// The raw string form used for cache persistence.
    ///
    /// `Text` round-trips exactly; `Structured` is re-serialized compactly.
    pub fn to_raw(&self) -> String {
        match self {
            DecodedValue::Text(s) => s.clone(),
            DecodedValue::Structured(v) => v.to_string(),
        }
    }
}

/// Decodes raw payload bytes into a [`DecodedValue`].
///
/// UTF-8 decoding falls back to a lossy representation rather than failing;
/// JSON parsing is opportunistic and keeps the text verbatim on failure.
pub fn decode(raw: &[u8]) -> DecodedValue {
    let text = match std::str::from_utf8(raw) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(raw).into_owned(),
    };
    decode_str(&text)
}

/// Decodes an already-textual payload (e.g. a cached raw value).
pub fn decode_str(text: &str) -> DecodedValue {
    match serde_json::from_str::<Value>(text) {
        Ok(v) => DecodedValue::Structured(v),
        Err(_) => DecodedValue::Text(text.to_string()),
    }
}
