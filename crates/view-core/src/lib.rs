//! # view-core
//!
//! Group-scoped views of domain entities for REST exposure layers.
//!
//! Every field of a domain type declares the visibility **groups** that may
//! see it. Per request, the engine derives the filtered view of an entity for
//! the caller's groups, folds partial update payloads into existing entities
//! without clobbering untouched fields, and negotiates and performs JSON, XML
//! and CSV encoding consistent with the filtered view.
//!
//! ## Quick start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use view_core::{FieldDescriptor, Format, GroupSet, TypeSchema, ViewEngine, Viewable};
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
//! let engine = ViewEngine::new();
//! let mut product = Product { id: 1, name: "a".into(), price: 10.0 };
//!
//! // Outbound: only fields in the "read" group.
//! let view = engine.filter(&product, &GroupSet::from(["read"])).unwrap();
//! assert_eq!(view, serde_json::json!({"id": 1, "name": "a"}));
//!
//! // Inbound: partial update.
//! engine
//!     .deserialize_and_merge(br#"{"name":"b"}"#, Format::Json, &mut product)
//!     .unwrap();
//! assert_eq!(product.name, "b");
//! assert_eq!(product.price, 10.0);
//! ```
//!
//! ## Modules
//!
//! - [`metadata`] -- field descriptors, type schemas, the [`Viewable`] trait
//! - [`groups`] -- group sets and the inclusion predicate
//! - [`cache`] -- memoized filtered shapes per (type, group set)
//! - [`filter`] -- recursive group filtering of values
//! - [`convert`] -- field-value assignment between shapes
//! - [`merge`] -- partial-update merge
//! - [`negotiate`] -- `Accept` / `Content-Type` handling
//! - [`codec`] -- JSON, XML and CSV encoders and decoders
//! - [`engine`] -- the [`ViewEngine`] facade
//! - [`document`] -- schema descriptors loaded from JSON at runtime
//! - [`error`] -- error types and structured error bodies

pub mod cache;
pub mod codec;
pub mod convert;
pub mod document;
pub mod engine;
pub mod error;
pub mod filter;
pub mod groups;
pub mod merge;
pub mod metadata;
pub mod negotiate;

pub use cache::{CacheKey, CacheStats, FilteredShape, ShapeCache};
pub use document::SchemaRegistry;
pub use engine::{EncodedBody, ViewEngine};
pub use error::{ErrorBody, ErrorCode, Result, ViewError};
pub use filter::GroupFilter;
pub use groups::{included_by_group, GroupSet};
pub use merge::{is_audit_field, Merger};
pub use metadata::{
    field_descriptors, FieldDescriptor, FieldKind, ScalarKind, SchemaRef, TypeSchema, Viewable,
};
pub use negotiate::{resolve, Format};
