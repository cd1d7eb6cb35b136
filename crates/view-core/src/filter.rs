//! Group filter -- derive the visible view of a value for a group set.
//!
//! The filter walks the serde-JSON rendering of a value together with its
//! [`FieldKind`] and keeps only the fields the requested groups may see, at
//! every nesting level. The source value is never modified; a new value is
//! built.
//!
//! Dispatch by kind:
//!
//! - **Struct**: emit the fields of the cached [`FilteredShape`](crate::cache::FilteredShape)
//!   in shape order, filtering each field value by its own kind. Nested structs
//!   therefore carry their own filtered sub-shape.
//! - **List**: an empty list is returned as is. Otherwise the first element's
//!   filtered keys fix the element shape and every later element is conformed
//!   to it.
//! - **Map**: each value is filtered, then assigned into the declared value kind
//!   with [`Assigner`]; a value with no conversion path fails the filter.
//! - **Pointer**: `null` passes through, anything else is filtered as the
//!   wrapped kind.
//! - **Scalar**: passed through.

use serde_json::{Map, Value};

use crate::cache::ShapeCache;
use crate::convert::{json_kind, Assigner};
use crate::error::{Result, ViewError};
use crate::groups::GroupSet;
use crate::metadata::{FieldKind, SchemaRef};

/// Filters values for one group set, sharing a [`ShapeCache`].
pub struct GroupFilter<'a> {
    cache: &'a ShapeCache,
    groups: &'a GroupSet,
}

impl<'a> GroupFilter<'a> {
    pub fn new(cache: &'a ShapeCache, groups: &'a GroupSet) -> Self {
        Self { cache, groups }
    }

    /// Filter `value`, whose structure is described by `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Shape`] when the value does not match its declared
    /// kind (for example a string where a struct is declared). That is a
    /// defect in the schema, not in the request.
    pub fn filter(&self, value: &Value, kind: &FieldKind) -> Result<Value> {
        match (kind, value) {
            (_, Value::Null) => Ok(Value::Null),
            (FieldKind::Pointer(inner), _) => self.filter(value, inner),
            (FieldKind::Scalar(_), _) => Ok(value.clone()),
            (FieldKind::Struct(schema), Value::Object(map)) => self.filter_struct(map, schema),
            (FieldKind::List(elem), Value::Array(items)) => self.filter_list(items, elem),
            (FieldKind::Map(inner), Value::Object(map)) => self.filter_map(map, inner),
            _ => Err(ViewError::shape(
                "",
                format!("expected {}, found {}", kind.label(), json_kind(value)),
            )),
        }
    }

    fn filter_struct(&self, map: &Map<String, Value>, schema: &SchemaRef) -> Result<Value> {
        let shape = self.cache.get_or_build(schema, self.groups);
        let mut out = Map::with_capacity(shape.len());
        for field in shape.fields() {
            // Fields skipped by the serializer stay absent.
            let Some(child) = map.get(&field.name) else {
                continue;
            };
            let filtered = self
                .filter(child, &field.kind)
                .map_err(|e| e.within(&field.name))?;
            out.insert(field.name.clone(), filtered);
        }
        Ok(Value::Object(out))
    }

    fn filter_list(&self, items: &[Value], elem: &FieldKind) -> Result<Value> {
        let Some((first, rest)) = items.split_first() else {
            return Ok(Value::Array(Vec::new()));
        };

        let first = self.filter(first, elem).map_err(|e| e.within("[0]"))?;
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in rest.iter().enumerate() {
            let filtered = self
                .filter(item, elem)
                .map_err(|e| e.within(&format!("[{}]", i + 1)))?;
            out.push(conform(filtered, &first));
        }
        out.insert(0, first);
        Ok(Value::Array(out))
    }

    fn filter_map(&self, map: &Map<String, Value>, inner: &FieldKind) -> Result<Value> {
        let assigner = Assigner::new(self.cache, self.groups);
        let mut out = Map::with_capacity(map.len());
        for (key, item) in map {
            let filtered = self.filter(item, inner).map_err(|e| e.within(key))?;
            let assigned = assigner
                .assign(&filtered, inner)
                .map_err(|e| e.within(key))?;
            out.insert(key.clone(), assigned);
        }
        Ok(Value::Object(out))
    }
}

/// Give an object the key set of `template`, in the template's order.
/// Missing keys become `null`; extra keys are dropped. Non-objects are
/// returned unchanged.
fn conform(value: Value, template: &Value) -> Value {
    match (value, template) {
        (Value::Object(mut map), Value::Object(keys)) => {
            if map.len() == keys.len() && keys.keys().all(|k| map.contains_key(k)) {
                return Value::Object(map);
            }
            let mut out = Map::with_capacity(keys.len());
            for key in keys.keys() {
                let value = map.remove(key).unwrap_or(Value::Null);
                out.insert(key.clone(), value);
            }
            Value::Object(out)
        }
        (value, _) => value,
    }
}
