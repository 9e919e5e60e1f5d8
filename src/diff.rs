//! # Structural payload diff.
//!
//! [`diff`] compares two decoded payloads and reports what changed:
//!
//! - both JSON objects → per-key `{old, new}` map covering every key present
//!   in either object whose values differ (a key missing on one side is
//!   treated as `null`);
//! - anything else → a single whole-value `{old, new}` record;
//! - identical payloads → `None`, which the recorder uses to suppress the
//!   event entirely.
//!
//! # Example
//! ```
//! use topiclens::{decode, diff, PayloadDiff};
//!
//! let old = decode(br#"{"state":"OFF","brightness":40}"#);
//! let new = decode(br#"{"state":"ON","brightness":40}"#);
//!
//! match diff(&old, &new) {
//!     Some(PayloadDiff::Fields(fields)) => {
//!         assert_eq!(fields.len(), 1);
//!         assert!(fields.contains_key("state"));
//!     }
//!     other => panic!("expected a field diff, got {other:?}"),
//! }
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::codec::DecodedValue;

/// One changed value: what it was before and what it is now.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldChange {
    /// Value before the update (`null` if the key was absent).
    pub old: Value,
    /// Value after the update (`null` if the key was removed).
    pub new: Value,
}

/// The observable difference between two payloads.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadDiff {
    /// Per-key changes between two JSON objects.
    Fields(BTreeMap<String, FieldChange>),
    /// Whole-value replacement when either side is not an object.
    Replaced(FieldChange),
}

impl PayloadDiff {
    /// Renders the diff as a JSON value for event output.
    pub fn to_json(&self) -> Value {
        // Serialize derives cannot fail on these shapes.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Computes the structural difference between two decoded payloads.
///
/// Returns `None` when the payloads are observably identical; the caller
/// must treat that as "no change" and emit nothing.
pub fn diff(old: &DecodedValue, new: &DecodedValue) -> Option<PayloadDiff> {
    let old_json = old.to_json();
    let new_json = new.to_json();

    match (&old_json, &new_json) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let mut fields = BTreeMap::new();
            for key in old_map.keys().chain(new_map.keys()) {
                if fields.contains_key(key.as_str()) {
                    continue;
                }
                let old_val = old_map.get(key).cloned().unwrap_or(Value::Null);
                let new_val = new_map.get(key).cloned().unwrap_or(Value::Null);
                if old_val != new_val {
                    fields.insert(
                        key.clone(),
                        FieldChange {
                            old: old_val,
                            new: new_val,
                        },
                    );
                }
            }
            if fields.is_empty() {
                None
            } else {
                Some(PayloadDiff::Fields(fields))
            }
        }
        _ => {
            if old_json == new_json {
                None
            } else {
                Some(PayloadDiff::Replaced(FieldChange {
                    old: old_json,
                    new: new_json,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_str;
    use serde_json::json;

    fn structured(v: Value) -> DecodedValue {
        DecodedValue::Structured(v)
    }

    #[test]
    fn test_identical_objects_no_diff() {
        let a = structured(json!({"x": 1, "y": "on"}));
        assert_eq!(diff(&a, &a.clone()), None);
    }

    #[test]
    fn test_changed_keys_only() {
        let old = structured(json!({"state": "OFF", "brightness": 40, "mode": "auto"}));
        let new = structured(json!({"state": "ON", "brightness": 40, "mode": "auto"}));
        match diff(&old, &new) {
            Some(PayloadDiff::Fields(fields)) => {
                assert_eq!(fields.len(), 1);
                let change = &fields["state"];
                assert_eq!(change.old, json!("OFF"));
                assert_eq!(change.new, json!("ON"));
            }
            other => panic!("expected field diff, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_key_treated_as_null() {
        let old = structured(json!({"a": 1}));
        let new = structured(json!({"a": 1, "b": 2}));
        match diff(&old, &new) {
            Some(PayloadDiff::Fields(fields)) => {
                assert_eq!(fields["b"].old, Value::Null);
                assert_eq!(fields["b"].new, json!(2));
            }
            other => panic!("expected field diff, got {other:?}"),
        }
    }

    #[test]
    fn test_removed_key_reported() {
        let old = structured(json!({"a": 1, "b": 2}));
        let new = structured(json!({"a": 1}));
        match diff(&old, &new) {
            Some(PayloadDiff::Fields(fields)) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields["b"].old, json!(2));
                assert_eq!(fields["b"].new, Value::Null);
            }
            other => panic!("expected field diff, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_pair_equal_is_empty() {
        let a = decode_str("42");
        assert_eq!(diff(&a, &a.clone()), None);

        let t = DecodedValue::Text("ON".to_string());
        assert_eq!(diff(&t, &t.clone()), None);
    }

    #[test]
    fn test_scalar_pair_differs_is_replacement() {
        let old = decode_str("42");
        let new = decode_str("43");
        assert_eq!(
            diff(&old, &new),
            Some(PayloadDiff::Replaced(FieldChange {
                old: json!(42),
                new: json!(43),
            }))
        );
    }

    #[test]
    fn test_object_vs_scalar_is_replacement() {
        let old = structured(json!({"a": 1}));
        let new = DecodedValue::Text("gone".to_string());
        match diff(&old, &new) {
            Some(PayloadDiff::Replaced(change)) => {
                assert_eq!(change.old, json!({"a": 1}));
                assert_eq!(change.new, json!("gone"));
            }
            other => panic!("expected replacement, got {other:?}"),
        }
    }

    #[test]
    fn test_diff_renders_field_map_json() {
        let old = structured(json!({"x": 1}));
        let new = structured(json!({"x": 2}));
        let rendered = diff(&old, &new).unwrap().to_json();
        assert_eq!(rendered, json!({"x": {"old": 1, "new": 2}}));
    }
}
