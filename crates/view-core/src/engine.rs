//! `ViewEngine` -- the serialization service that ties the pieces together.
//!
//! The engine owns the [`ShapeCache`] and exposes the operations a REST layer
//! calls per request: filter an entity for the caller's groups, negotiate and
//! encode a response body, decode a request body, and fold a partial update
//! into an existing entity.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::cache::ShapeCache;
use crate::codec;
use crate::convert;
use crate::error::{Result, ViewError};
use crate::filter::GroupFilter;
use crate::groups::GroupSet;
use crate::merge::Merger;
use crate::metadata::{FieldKind, Viewable};
use crate::negotiate::{self, Format};

/// An encoded response body with the headers that describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub format: Format,
    pub bytes: Vec<u8>,
}

impl EncodedBody {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    /// `Content-Length` to send; only JSON variants carry one.
    pub fn content_length(&self) -> Option<usize> {
        self.format.is_json().then_some(self.bytes.len())
    }
}

/// Filtering, encoding, decoding and merging for domain entities.
#[derive(Debug, Clone, Default)]
pub struct ViewEngine {
    cache: Arc<ShapeCache>,
}

impl ViewEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine on a cache shared with other engines.
    pub fn with_cache(cache: Arc<ShapeCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &ShapeCache {
        &self.cache
    }

    /// The visible view of `value` for `groups`.
    pub fn filter<T: Viewable>(&self, value: &T, groups: &GroupSet) -> Result<Value> {
        self.filter_value(&to_json(value)?, &FieldKind::of::<T>(), groups)
    }

    /// The visible view of an already-rendered value of kind `root`.
    pub fn filter_value(&self, value: &Value, root: &FieldKind, groups: &GroupSet) -> Result<Value> {
        GroupFilter::new(&self.cache, groups).filter(value, root)
    }

    /// Encode `value` (of kind `root`) in `format` for `groups`.
    pub fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
        root: &FieldKind,
        format: Format,
        groups: &GroupSet,
    ) -> Result<EncodedBody> {
        self.encode_value(&to_json(value)?, root, format, groups)
    }

    pub fn encode_value(
        &self,
        value: &Value,
        root: &FieldKind,
        format: Format,
        groups: &GroupSet,
    ) -> Result<EncodedBody> {
        let bytes = codec::encode(value, root, format, groups, &self.cache)?;
        Ok(EncodedBody { format, bytes })
    }

    /// Negotiate the format from an `Accept` header, then encode.
    pub fn respond<T: Serialize + ?Sized>(
        &self,
        value: &T,
        root: &FieldKind,
        accept: &str,
        groups: &GroupSet,
    ) -> Result<EncodedBody> {
        let format = negotiate::resolve(accept)?;
        self.encode(value, root, format, groups)
    }

    /// Decode a single `T` from a request body.
    pub fn decode<T: Viewable>(&self, bytes: &[u8], format: Format) -> Result<T> {
        let value = self.decode_value(bytes, format, &FieldKind::of::<T>())?;
        Ok(serde_json::from_value(value)?)
    }

    /// Decode a list of `T`, the only shape CSV supports.
    pub fn decode_list<T: Viewable>(&self, bytes: &[u8], format: Format) -> Result<Vec<T>> {
        let value = self.decode_value(bytes, format, &FieldKind::list_of::<T>())?;
        Ok(serde_json::from_value(value)?)
    }

    /// Decode a body into a value shaped like `root`.
    ///
    /// Every format is checked against the declared kinds, so a JSON body
    /// carrying `"free"` for an `int` field fails here just as the XML and CSV
    /// text would.
    pub fn decode_value(&self, bytes: &[u8], format: Format, root: &FieldKind) -> Result<Value> {
        let value = codec::decode(bytes, format, root, &self.cache)?;
        convert::validate(&value, root, &self.cache).map_err(ViewError::into_schema)?;
        Ok(value)
    }

    /// Decode `payload` into a fresh `T` and merge it into `target`.
    ///
    /// Fields the payload leaves at their zero value keep the target's value;
    /// audit timestamps are never taken from the payload. On any error
    /// `target` is left unmodified.
    pub fn deserialize_and_merge<T: Viewable>(
        &self,
        payload: &[u8],
        format: Format,
        target: &mut T,
    ) -> Result<()> {
        let source: T = self.decode(payload, format)?;
        let mut merged = to_json(&*target)?;
        Merger::new(&self.cache).merge(&mut merged, &to_json(&source)?, &FieldKind::of::<T>());
        *target = serde_json::from_value(merged).map_err(|e| ViewError::shape("", e.to_string()))?;
        Ok(())
    }

    /// Merge a decoded `payload` into a rendered `target` of kind `root`.
    ///
    /// Used with runtime schemas, where there is no Rust type to decode into;
    /// fields absent from the payload are simply missing from the source.
    /// A payload that fails the type check of [`decode_value`](Self::decode_value)
    /// leaves `target` untouched.
    pub fn merge_value(
        &self,
        payload: &[u8],
        format: Format,
        target: &mut Value,
        root: &FieldKind,
    ) -> Result<()> {
        let source = self.decode_value(payload, format, root)?;
        Merger::new(&self.cache).merge(target, &source, root);
        Ok(())
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ViewError::Encode(e.to_string()))
}
