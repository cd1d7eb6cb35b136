//! CSV codec for lists of uniformly-shaped structs.
//!
//! The header row lists the visible field names in shape order; each data row
//! projects the same fields. An empty list encodes to an empty body, without
//! a header.
//!
//! Decoding maps columns onto the struct's exported fields **by position**,
//! not by header name. A file whose columns were reordered, or one encoded for
//! a group set that hides a leading field, decodes into the wrong fields.
//!
//! Cells of `any` fields hold JSON text; strings there are quoted so that
//! `"007"` does not come back as a number.

use ::csv::{ReaderBuilder, Terminator, WriterBuilder};
use serde_json::{Map, Value};

use super::{parse_text, scalar_text};
use crate::cache::ShapeCache;
use crate::error::{Result, ViewError};
use crate::filter::GroupFilter;
use crate::groups::GroupSet;
use crate::metadata::{FieldKind, SchemaRef};

pub fn encode(
    value: &Value,
    root: &FieldKind,
    groups: &GroupSet,
    cache: &ShapeCache,
) -> Result<Vec<u8>> {
    let schema = row_schema(root)?;
    let Value::Array(items) = value else {
        return Err(not_a_list());
    };
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let filtered = GroupFilter::new(cache, groups).filter(value, root)?;
    let shape = cache.get_or_build(schema, groups);

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(shape.names()).map_err(encode_error)?;
    for row in filtered.as_array().into_iter().flatten() {
        let cells = shape.fields().iter().map(|field| {
            row.get(&field.name)
                .map(|cell| scalar_text(cell, &field.kind))
                .unwrap_or_default()
        });
        writer.write_record(cells).map_err(encode_error)?;
    }
    writer.into_inner().map_err(encode_error)
}

pub fn decode(bytes: &[u8], root: &FieldKind, cache: &ShapeCache) -> Result<Value> {
    let schema = row_schema(root)?;
    let shape = cache.get_or_build(schema, &GroupSet::none());

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ViewError::Schema(format!("invalid CSV: {e}")))?;
        let mut row = Map::with_capacity(shape.len());
        for (field, cell) in shape.fields().iter().zip(record.iter()) {
            // Empty cells stay at the field's zero value.
            if cell.is_empty() {
                continue;
            }
            let value = parse_text(cell, &field.kind)
                .map_err(|e| e.within(&field.name).within(&format!("[{line}]")).into_schema())?;
            row.insert(field.name.clone(), value);
        }
        rows.push(Value::Object(row));
    }
    Ok(Value::Array(rows))
}

/// The struct schema of the rows of a CSV document.
fn row_schema(root: &FieldKind) -> Result<&SchemaRef> {
    match root.unwrap_pointer() {
        FieldKind::List(elem) => match elem.unwrap_pointer() {
            FieldKind::Struct(schema) => Ok(schema),
            _ => Err(not_a_list()),
        },
        _ => Err(not_a_list()),
    }
}

fn not_a_list() -> ViewError {
    ViewError::UnsupportedFormat("csv requires a list of structs".to_string())
}

fn encode_error(err: impl std::fmt::Display) -> ViewError {
    ViewError::Encode(format!("CSV: {err}"))
}
