//! Schema documents -- type descriptors loaded at runtime.
//!
//! Lets tools work with entities that have no Rust type, by describing them in
//! JSON:
//!
//! ```json
//! {
//!   "types": {
//!     "Vendor":  { "fields": [ { "name": "name", "groups": "read", "kind": "string" } ] },
//!     "Product": { "fields": [
//!       { "name": "id",     "groups": "read",       "kind": "uint" },
//!       { "name": "vendor", "groups": "read",       "kind": { "struct": "Vendor" } },
//!       { "name": "tags",   "groups": "read,write", "kind": { "list": "string" } }
//!     ] }
//!   }
//! }
//! ```
//!
//! Struct references are resolved by name when the document is loaded;
//! unknown names and reference cycles are rejected.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Result, ViewError};
use crate::metadata::{FieldDescriptor, FieldKind, ScalarKind, SchemaRef, TypeSchema};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    types: BTreeMap<String, RawType>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawType {
    fields: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    name: String,
    #[serde(default)]
    groups: String,
    #[serde(default = "default_exported")]
    exported: bool,
    #[serde(default)]
    anonymous: bool,
    kind: RawKind,
}

fn default_exported() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Any,
    Struct(String),
    List(Box<RawKind>),
    Map(Box<RawKind>),
    Pointer(Box<RawKind>),
}

/// Named type schemas loaded from a schema document.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, Arc<TypeSchema>>,
}

impl SchemaRegistry {
    /// Parse and resolve a JSON schema document.
    ///
    /// # Errors
    ///
    /// [`ViewError::Schema`] for malformed documents, unknown struct
    /// references, and reference cycles.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawDocument = serde_json::from_str(text)?;
        let mut registry = SchemaRegistry::default();
        for name in raw.types.keys() {
            let mut visiting = Vec::new();
            registry.resolve(name, &raw.types, &mut visiting)?;
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<SchemaRef> {
        self.types.get(name).map(|schema| SchemaRef::Shared(Arc::clone(schema)))
    }

    /// The struct kind of the named type.
    pub fn kind(&self, name: &str) -> Option<FieldKind> {
        self.get(name).map(FieldKind::Struct)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn resolve(
        &mut self,
        name: &str,
        raw: &BTreeMap<String, RawType>,
        visiting: &mut Vec<String>,
    ) -> Result<Arc<TypeSchema>> {
        if let Some(done) = self.types.get(name) {
            return Ok(Arc::clone(done));
        }
        if visiting.iter().any(|v| v == name) {
            visiting.push(name.to_string());
            return Err(ViewError::Schema(format!(
                "cyclic type reference: {}",
                visiting.join(" -> ")
            )));
        }
        let raw_type = raw
            .get(name)
            .ok_or_else(|| ViewError::Schema(format!("unknown type '{name}'")))?;

        visiting.push(name.to_string());
        let mut schema = TypeSchema::named(name);
        for field in &raw_type.fields {
            let kind = self
                .resolve_kind(&field.kind, raw, visiting)
                .map_err(|e| match e {
                    ViewError::Schema(msg) => {
                        ViewError::Schema(format!("{name}.{}: {msg}", field.name))
                    }
                    other => other,
                })?;
            let mut descriptor = FieldDescriptor::new(field.name.clone(), kind).groups(&field.groups);
            descriptor.exported = field.exported;
            descriptor.anonymous = field.anonymous;
            schema = schema.field(descriptor);
        }
        visiting.pop();

        let schema = Arc::new(schema);
        self.types.insert(name.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    fn resolve_kind(
        &mut self,
        kind: &RawKind,
        raw: &BTreeMap<String, RawType>,
        visiting: &mut Vec<String>,
    ) -> Result<FieldKind> {
        Ok(match kind {
            RawKind::Bool => FieldKind::Scalar(ScalarKind::Bool),
            RawKind::Int => FieldKind::Scalar(ScalarKind::Int),
            RawKind::Uint => FieldKind::Scalar(ScalarKind::UInt),
            RawKind::Float => FieldKind::Scalar(ScalarKind::Float),
            RawKind::String => FieldKind::Scalar(ScalarKind::String),
            RawKind::Any => FieldKind::Scalar(ScalarKind::Any),
            RawKind::Struct(target) => {
                FieldKind::Struct(SchemaRef::Shared(self.resolve(target, raw, visiting)?))
            }
            RawKind::List(inner) => FieldKind::list(self.resolve_kind(inner, raw, visiting)?),
            RawKind::Map(inner) => FieldKind::map(self.resolve_kind(inner, raw, visiting)?),
            RawKind::Pointer(inner) => FieldKind::pointer(self.resolve_kind(inner, raw, visiting)?),
        })
    }
}
