//! JSON codec: filter, then serialize; decode structurally.

use serde_json::Value;

use crate::cache::ShapeCache;
use crate::error::{Result, ViewError};
use crate::filter::GroupFilter;
use crate::groups::GroupSet;
use crate::metadata::FieldKind;

pub fn encode(
    value: &Value,
    root: &FieldKind,
    groups: &GroupSet,
    cache: &ShapeCache,
) -> Result<Vec<u8>> {
    let filtered = GroupFilter::new(cache, groups).filter(value, root)?;
    serde_json::to_vec(&filtered).map_err(|e| ViewError::Encode(e.to_string()))
}

pub fn decode(bytes: &[u8]) -> Result<Value> {
    Ok(serde_json::from_slice(bytes)?)
}
