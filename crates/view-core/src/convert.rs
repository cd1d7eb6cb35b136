//! Field-value assignment into a differently-shaped destination.
//!
//! [`Assigner::assign`] tries, in order:
//!
//! 1. the value already fits the destination kind: copy it;
//! 2. the destination is optional: assign into the wrapped kind;
//! 3. the value is struct-, list-, or map-shaped: assign member by member,
//!    matching struct fields by name;
//! 4. both sides are scalars: convert between numbers, strings, and booleans;
//! 5. otherwise fail with [`ViewError::Shape`].

use serde_json::{Map, Number, Value};

use crate::cache::ShapeCache;
use crate::error::{Result, ViewError};
use crate::groups::GroupSet;
use crate::metadata::{FieldKind, ScalarKind, SchemaRef};

/// Assigns values into filtered destination shapes for one group set.
pub struct Assigner<'a> {
    cache: &'a ShapeCache,
    groups: &'a GroupSet,
}

impl<'a> Assigner<'a> {
    pub fn new(cache: &'a ShapeCache, groups: &'a GroupSet) -> Self {
        Self { cache, groups }
    }

    /// Produce a value of kind `dest` from `value`.
    pub fn assign(&self, value: &Value, dest: &FieldKind) -> Result<Value> {
        if self.fits(value, dest) {
            return Ok(value.clone());
        }
        match (dest, value) {
            (FieldKind::Pointer(inner), _) => self.assign(value, inner),
            (FieldKind::Struct(schema), Value::Object(map)) => self.assign_struct(map, schema),
            (FieldKind::List(elem), Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    self.assign(item, elem)
                        .map_err(|e| e.within(&format!("[{i}]")))
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            (FieldKind::Map(inner), Value::Object(map)) => {
                let mut out = Map::with_capacity(map.len());
                for (key, item) in map {
                    out.insert(key.clone(), self.assign(item, inner).map_err(|e| e.within(key))?);
                }
                Ok(Value::Object(out))
            }
            (FieldKind::Scalar(kind), _) => convert_scalar(value, *kind).ok_or_else(|| {
                ViewError::shape(
                    "",
                    format!("cannot convert {} to {}", json_kind(value), kind.label()),
                )
            }),
            _ => Err(ViewError::shape(
                "",
                format!("cannot assign {} to {}", json_kind(value), dest.label()),
            )),
        }
    }

    /// Copy `map` field by field into the filtered shape of `schema`.
    /// Destination fields without a same-named source field get their zero
    /// value; source fields without a destination are dropped.
    fn assign_struct(&self, map: &Map<String, Value>, schema: &SchemaRef) -> Result<Value> {
        let shape = self.cache.get_or_build(schema, self.groups);
        let mut out = Map::with_capacity(shape.len());
        for field in shape.fields() {
            let value = match map.get(&field.name) {
                Some(source) => self
                    .assign(source, &field.kind)
                    .map_err(|e| e.within(&field.name))?,
                None => field.kind.zero_value(),
            };
            out.insert(field.name.clone(), value);
        }
        Ok(Value::Object(out))
    }

    /// Whether `value` can be stored as `dest` without any change.
    fn fits(&self, value: &Value, dest: &FieldKind) -> bool {
        match (dest, value) {
            (FieldKind::Pointer(_), Value::Null) => true,
            (FieldKind::Pointer(inner), _) => self.fits(value, inner),
            (FieldKind::Scalar(kind), _) => scalar_fits(value, *kind),
            (FieldKind::Struct(schema), Value::Object(map)) => {
                let shape = self.cache.get_or_build(schema, self.groups);
                map.len() == shape.len()
                    && shape.fields().iter().all(|field| {
                        map.get(&field.name)
                            .is_some_and(|v| self.fits(v, &field.kind))
                    })
            }
            (FieldKind::List(elem), Value::Array(items)) => {
                items.iter().all(|item| self.fits(item, elem))
            }
            (FieldKind::Map(inner), Value::Object(map)) => {
                map.values().all(|item| self.fits(item, inner))
            }
            _ => false,
        }
    }
}

/// Check that `value` already has the structure and scalar types of `kind`,
/// without converting anything.
///
/// `null` is accepted anywhere and object keys unknown to a struct are
/// ignored; both read as "absent" to the merge engine. An `int` field holding
/// a string, or a `uint` field holding `-3`, is an error.
pub fn validate(value: &Value, kind: &FieldKind, cache: &ShapeCache) -> Result<()> {
    match (kind, value) {
        (_, Value::Null) => Ok(()),
        (FieldKind::Pointer(inner), _) => validate(value, inner, cache),
        (FieldKind::Scalar(scalar), _) if scalar_fits(value, *scalar) => Ok(()),
        (FieldKind::Struct(schema), Value::Object(map)) => {
            let shape = cache.get_or_build(schema, &GroupSet::none());
            for field in shape.fields() {
                if let Some(child) = map.get(&field.name) {
                    validate(child, &field.kind, cache).map_err(|e| e.within(&field.name))?;
                }
            }
            Ok(())
        }
        (FieldKind::List(elem), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                validate(item, elem, cache).map_err(|e| e.within(&format!("[{i}]")))?;
            }
            Ok(())
        }
        (FieldKind::Map(inner), Value::Object(map)) => {
            for (key, item) in map {
                validate(item, inner, cache).map_err(|e| e.within(key))?;
            }
            Ok(())
        }
        _ => Err(ViewError::shape(
            "",
            format!("expected {}, found {}", kind.label(), json_kind(value)),
        )),
    }
}

fn scalar_fits(value: &Value, kind: ScalarKind) -> bool {
    match kind {
        ScalarKind::Any => true,
        ScalarKind::Bool => value.is_boolean(),
        ScalarKind::Int => value.is_i64(),
        ScalarKind::UInt => value.is_u64(),
        ScalarKind::Float => value.is_number(),
        ScalarKind::String => value.is_string(),
    }
}

/// Convert a scalar JSON value to `kind`, or `None` if no lossless-enough
/// conversion exists. Integral floats narrow to integers; numeric strings
/// parse; booleans accept `true`/`false`/`1`/`0`.
pub fn convert_scalar(value: &Value, kind: ScalarKind) -> Option<Value> {
    if scalar_fits(value, kind) {
        return Some(value.clone());
    }
    match kind {
        ScalarKind::Any => Some(value.clone()),
        ScalarKind::Int => to_f64(value)
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| Value::from(f as i64))
            .or_else(|| {
                value
                    .as_str()
                    .and_then(|s| s.trim().parse::<i64>().ok())
                    .map(Value::from)
            }),
        ScalarKind::UInt => to_f64(value)
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
            .map(|f| Value::from(f as u64))
            .or_else(|| {
                value
                    .as_str()
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .map(Value::from)
            }),
        ScalarKind::Float => to_f64(value)
            .and_then(Number::from_f64)
            .map(Value::Number),
        ScalarKind::String => match value {
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        ScalarKind::Bool => match value {
            Value::String(s) => match s.trim() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            Value::Number(n) => n.as_f64().map(|f| Value::Bool(f != 0.0)),
            _ => None,
        },
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// JSON type name of a value, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
