//! Merge engine -- fold a partial update into an existing entity.
//!
//! The source of a merge is always a freshly decoded, zero-initialized value,
//! so a zero value in the source is read as "absent from the payload" and the
//! target field is left untouched. A client therefore cannot reset a field to
//! its zero value through a merge.
//!
//! Rules, applied field by field in descriptor order:
//!
//! - audit fields (`created_at`, `updated_at`, `deleted_at`, in any casing or
//!   separator style) and unexported fields are never written;
//! - a zero source value is skipped;
//! - structs recurse, allocating a zero target when the target is `null`;
//! - lists merge element-wise by position, appending merged zero elements when
//!   the source is longer;
//! - anything else overwrites the target.

use serde_json::Value;
use tracing::trace;

use crate::cache::ShapeCache;
use crate::groups::GroupSet;
use crate::metadata::{FieldKind, SchemaRef};

/// Normalized names of the audit timestamps.
const AUDIT_FIELDS: [&str; 3] = ["createdat", "updatedat", "deletedat"];

/// Whether `name` denotes an audit timestamp, ignoring case and `_`/`-`.
pub fn is_audit_field(name: &str) -> bool {
    let normalized: String = name
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();
    AUDIT_FIELDS.contains(&normalized.as_str())
}

/// Whether `value` is the zero value of its type.
///
/// `null`, `false`, `0`, `""` and `[]` are zero; an object is zero when all of
/// its members are.
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.values().all(is_zero),
    }
}

/// Merges source values into targets using the cached full shapes.
pub struct Merger<'a> {
    cache: &'a ShapeCache,
}

impl<'a> Merger<'a> {
    pub fn new(cache: &'a ShapeCache) -> Self {
        Self { cache }
    }

    /// Merge `source` into `target`; both are renderings of `kind`.
    pub fn merge(&self, target: &mut Value, source: &Value, kind: &FieldKind) {
        if is_zero(source) {
            return;
        }
        match kind {
            FieldKind::Pointer(inner) => self.merge(target, source, inner),
            FieldKind::Struct(schema) if source.is_object() => {
                self.merge_struct(target, source, schema)
            }
            FieldKind::List(elem) if source.is_array() && target.is_array() => {
                self.merge_list(target, source, elem)
            }
            _ => *target = source.clone(),
        }
    }

    fn merge_struct(&self, target: &mut Value, source: &Value, schema: &SchemaRef) {
        if !target.is_object() {
            *target = schema.resolve().zero_value();
            if !target.is_object() {
                *target = Value::Object(Default::default());
            }
        }
        let (Some(target), Some(source)) = (target.as_object_mut(), source.as_object()) else {
            return;
        };

        let shape = self.cache.get_or_build(schema, &GroupSet::none());
        for field in shape.fields() {
            if is_audit_field(&field.name) {
                if source.get(&field.name).is_some_and(|v| !is_zero(v)) {
                    trace!(field = %field.name, "ignoring audit field in merge payload");
                }
                continue;
            }
            let Some(value) = source.get(&field.name) else {
                continue;
            };
            if is_zero(value) {
                continue;
            }
            let slot = target.entry(field.name.clone()).or_insert(Value::Null);
            self.merge(slot, value, &field.kind);
        }
    }

    fn merge_list(&self, target: &mut Value, source: &Value, elem: &FieldKind) {
        let (Some(target), Some(source)) = (target.as_array_mut(), source.as_array()) else {
            return;
        };
        for (i, item) in source.iter().enumerate() {
            match target.get_mut(i) {
                Some(slot) => self.merge(slot, item, elem),
                None => {
                    let mut fresh = elem.zero_value();
                    self.merge(&mut fresh, item, elem);
                    target.push(fresh);
                }
            }
        }
    }
}
