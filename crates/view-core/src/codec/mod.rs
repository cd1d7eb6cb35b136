//! Format codec -- encode filtered views and decode payloads.
//!
//! Every encoder applies the group filter: JSON and CSV encode the filtered
//! value, XML checks the group predicate while walking the tree. Decoders do
//! not filter; what a payload may change is decided by the merge engine.
//!
//! All encoders build the complete output before returning, so a failure
//! never yields a partial body.

pub mod csv;
pub mod json;
pub mod xml;

use serde_json::Value;

use crate::cache::ShapeCache;
use crate::convert::convert_scalar;
use crate::error::{Result, ViewError};
use crate::groups::GroupSet;
use crate::metadata::{FieldKind, ScalarKind};
use crate::negotiate::Format;

/// Encode `value` (a rendering of `root`) in `format` for `groups`.
pub fn encode(
    value: &Value,
    root: &FieldKind,
    format: Format,
    groups: &GroupSet,
    cache: &ShapeCache,
) -> Result<Vec<u8>> {
    match format {
        Format::Json | Format::JsonLd => json::encode(value, root, groups, cache),
        Format::Xml => xml::encode(value, root, groups, cache),
        Format::Csv => csv::encode(value, root, groups, cache),
    }
}

/// Decode `bytes` in `format` into a value shaped like `root`.
pub fn decode(bytes: &[u8], format: Format, root: &FieldKind, cache: &ShapeCache) -> Result<Value> {
    match format {
        Format::Json | Format::JsonLd => json::decode(bytes),
        Format::Xml => xml::decode(bytes, root, cache),
        Format::Csv => csv::decode(bytes, root, cache),
    }
}

/// Text form of a leaf value of kind `kind` in XML and CSV: strings verbatim,
/// numbers and booleans in JSON notation, nested values as compact JSON,
/// `null` empty.
///
/// A string in an `any` field is written JSON-quoted (`"007"`), since the
/// decoder reads `any` text as JSON first and would otherwise turn it into
/// the number `7`.
pub(crate) fn scalar_text(value: &Value, kind: &FieldKind) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) if !matches!(kind.unwrap_pointer(), FieldKind::Scalar(ScalarKind::Any)) => {
            s.clone()
        }
        other => other.to_string(),
    }
}

/// Inverse of [`scalar_text`] for a value of kind `kind`.
///
/// `any` text that is not valid JSON falls back to a plain string, so bodies
/// written by hand may leave `any` strings unquoted.
pub(crate) fn parse_text(text: &str, kind: &FieldKind) -> Result<Value> {
    match kind.unwrap_pointer() {
        FieldKind::Scalar(ScalarKind::Any) => {
            Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
        }
        FieldKind::Scalar(scalar) => convert_scalar(&Value::String(text.to_string()), *scalar)
            .ok_or_else(|| {
                ViewError::shape("", format!("invalid {} value {:?}", scalar.label(), text))
            }),
        nested => serde_json::from_str(text)
            .map_err(|e| ViewError::shape("", format!("invalid {}: {e}", nested.label()))),
    }
}
