//! Field metadata: per-type schema descriptors.
//!
//! Every domain type exposes an ordered list of [`FieldDescriptor`]s through
//! the [`Viewable`] trait. A descriptor names the serialized key of a field,
//! the groups that may see it, and the structural [`FieldKind`] of its value.
//! The engine never inspects Rust types at runtime; it walks the serde-JSON
//! rendering of a value alongside these descriptors.
//!
//! # Example
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use view_core::{FieldDescriptor, TypeSchema, Viewable};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Product {
//!     id: u64,
//!     name: String,
//!     price: f64,
//! }
//!
//! impl Viewable for Product {
//!     fn schema() -> TypeSchema {
//!         TypeSchema::of::<Self>()
//!             .field(FieldDescriptor::uint("id").groups("read"))
//!             .field(FieldDescriptor::string("name").groups("read,write"))
//!             .field(FieldDescriptor::float("price").groups("write"))
//!     }
//! }
//!
//! let names: Vec<String> = Product::schema()
//!     .descriptors()
//!     .into_iter()
//!     .map(|f| f.name)
//!     .collect();
//! assert_eq!(names, ["id", "name", "price"]);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::groups::GroupSet;

/// A domain type the engine can filter, merge, and encode.
///
/// Implementations should carry `#[serde(default)]` so that a partial payload
/// decodes into a zero-initialized instance; anonymous (embedded) fields are
/// expected to be `#[serde(flatten)]`.
pub trait Viewable: Serialize + DeserializeOwned + Default + 'static {
    /// The ordered field list of this type.
    fn schema() -> TypeSchema;
}

/// The scalar flavours a leaf field can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    UInt,
    Float,
    String,
    /// Opaque JSON; passed through untouched.
    Any,
}

impl ScalarKind {
    pub fn zero_value(self) -> Value {
        match self {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::Int | ScalarKind::UInt => Value::from(0),
            ScalarKind::Float => Value::from(0.0),
            ScalarKind::String => Value::String(String::new()),
            ScalarKind::Any => Value::Null,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::UInt => "uint",
            ScalarKind::Float => "float",
            ScalarKind::String => "string",
            ScalarKind::Any => "any",
        }
    }
}

/// A reference to the schema of a nested struct.
///
/// Static references are keyed by the Rust type name and build the schema only
/// when the shape cache misses. Shared references wrap a schema loaded at
/// runtime (see [`crate::document`]).
#[derive(Clone)]
pub enum SchemaRef {
    Static {
        name: &'static str,
        build: fn() -> TypeSchema,
    },
    Shared(Arc<TypeSchema>),
}

impl SchemaRef {
    pub fn of<T: Viewable>() -> Self {
        SchemaRef::Static {
            name: std::any::type_name::<T>(),
            build: T::schema,
        }
    }

    pub fn shared(schema: TypeSchema) -> Self {
        SchemaRef::Shared(Arc::new(schema))
    }

    /// Type identity used in cache keys.
    pub fn type_name(&self) -> &str {
        match self {
            SchemaRef::Static { name, .. } => name,
            SchemaRef::Shared(schema) => schema.name(),
        }
    }

    pub fn resolve(&self) -> Cow<'_, TypeSchema> {
        match self {
            SchemaRef::Static { build, .. } => Cow::Owned(build()),
            SchemaRef::Shared(schema) => Cow::Borrowed(schema.as_ref()),
        }
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaRef({})", self.type_name())
    }
}

impl PartialEq for SchemaRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name()
    }
}

/// Structural kind of a field's value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Struct(SchemaRef),
    List(Box<FieldKind>),
    Map(Box<FieldKind>),
    /// Optional wrapper; `null` means absent.
    Pointer(Box<FieldKind>),
}

impl FieldKind {
    /// Kind of a single `T`.
    pub fn of<T: Viewable>() -> Self {
        FieldKind::Struct(SchemaRef::of::<T>())
    }

    /// Kind of a `Vec<T>`.
    pub fn list_of<T: Viewable>() -> Self {
        FieldKind::List(Box::new(Self::of::<T>()))
    }

    pub fn list(elem: FieldKind) -> Self {
        FieldKind::List(Box::new(elem))
    }

    pub fn map(value: FieldKind) -> Self {
        FieldKind::Map(Box::new(value))
    }

    pub fn pointer(inner: FieldKind) -> Self {
        FieldKind::Pointer(Box::new(inner))
    }

    /// Strip any pointer wrappers.
    pub fn unwrap_pointer(&self) -> &FieldKind {
        match self {
            FieldKind::Pointer(inner) => inner.unwrap_pointer(),
            other => other,
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, FieldKind::Struct(_))
    }

    /// JSON rendering of the zero value of this kind.
    pub fn zero_value(&self) -> Value {
        match self {
            FieldKind::Scalar(kind) => kind.zero_value(),
            FieldKind::Struct(schema) => schema.resolve().zero_value(),
            FieldKind::List(_) => Value::Array(Vec::new()),
            FieldKind::Map(_) => Value::Object(Map::new()),
            FieldKind::Pointer(_) => Value::Null,
        }
    }

    /// Short human-readable description, used in error messages.
    pub fn label(&self) -> String {
        match self {
            FieldKind::Scalar(kind) => kind.label().to_string(),
            FieldKind::Struct(schema) => format!("struct {}", short_type_name(schema.type_name())),
            FieldKind::List(elem) => format!("list<{}>", elem.label()),
            FieldKind::Map(value) => format!("map<{}>", value.label()),
            FieldKind::Pointer(inner) => format!("optional<{}>", inner.label()),
        }
    }
}

/// Descriptor of one field: name, visibility groups, and value kind.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Serialized key of the field.
    pub name: String,
    pub groups: GroupSet,
    /// Unexported fields never leave the engine, whatever the groups.
    pub exported: bool,
    /// Anonymous fields are flattened into their parent.
    pub anonymous: bool,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            groups: GroupSet::none(),
            exported: true,
            anonymous: false,
            kind,
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Bool))
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Int))
    }

    pub fn uint(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::UInt))
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Float))
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::String))
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Any))
    }

    /// A nested struct field of type `T`.
    pub fn nested<T: Viewable>(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::of::<T>())
    }

    /// An optional nested struct field of type `T`.
    pub fn optional<T: Viewable>(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::pointer(FieldKind::of::<T>()))
    }

    pub fn list(name: impl Into<String>, elem: FieldKind) -> Self {
        Self::new(name, FieldKind::list(elem))
    }

    pub fn map(name: impl Into<String>, value: FieldKind) -> Self {
        Self::new(name, FieldKind::map(value))
    }

    /// An embedded `T` whose fields are promoted into the parent.
    pub fn embedded<T: Viewable>() -> Self {
        let mut field = Self::new(
            short_type_name(std::any::type_name::<T>()),
            FieldKind::of::<T>(),
        );
        field.anonymous = true;
        field
    }

    /// Set the groups from a comma-separated annotation.
    pub fn groups(mut self, annotation: &str) -> Self {
        self.groups = GroupSet::parse(annotation);
        self
    }

    /// Mark the field as internal-only.
    pub fn private(mut self) -> Self {
        self.exported = false;
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }
}

/// The ordered raw field list of one type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSchema {
    name: String,
    fields: Vec<FieldDescriptor>,
    zero: Option<Value>,
}

impl TypeSchema {
    /// Schema for a Rust type; its zero value is `T::default()`.
    pub fn of<T: Serialize + Default + 'static>() -> Self {
        Self {
            name: std::any::type_name::<T>().to_string(),
            fields: Vec::new(),
            zero: serde_json::to_value(T::default()).ok(),
        }
    }

    /// Schema without a backing Rust type; its zero value is derived from the
    /// field kinds.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            zero: None,
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last path segment of the type name, e.g. `Product` for `shop::Product`.
    pub fn short_name(&self) -> &str {
        short_type_name(&self.name)
    }

    /// Raw fields in declaration order, including unexported and anonymous ones.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Exported fields with anonymous members promoted; see [`field_descriptors`].
    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        field_descriptors(self)
    }

    pub fn zero_value(&self) -> Value {
        match &self.zero {
            Some(zero) => zero.clone(),
            None => Value::Object(
                self.descriptors()
                    .into_iter()
                    .map(|field| {
                        let zero = field.kind.zero_value();
                        (field.name, zero)
                    })
                    .collect(),
            ),
        }
    }
}

/// Produce the ordered descriptor list of a type.
///
/// Unexported fields are dropped. Anonymous struct fields are not emitted
/// themselves; their visible members are appended after the parent's own
/// fields (recursively, so embedded-in-embedded members are promoted too).
/// A promoted member never shadows an own field of the same name.
pub fn field_descriptors(schema: &TypeSchema) -> Vec<FieldDescriptor> {
    let mut own: Vec<FieldDescriptor> = Vec::with_capacity(schema.fields.len());
    let mut promoted: Vec<FieldDescriptor> = Vec::new();

    for field in &schema.fields {
        if !field.exported {
            continue;
        }
        match (field.anonymous, field.kind.unwrap_pointer()) {
            (true, FieldKind::Struct(embedded)) => {
                promoted.extend(field_descriptors(&embedded.resolve()));
            }
            _ => own.push(field.clone()),
        }
    }

    for field in promoted {
        if !own.iter().any(|f| f.name == field.name) {
            own.push(field);
        }
    }
    own
}

pub(crate) fn short_type_name(name: &str) -> &str {
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}
