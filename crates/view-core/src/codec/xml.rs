//! XML codec.
//!
//! There is no serializer-level field filtering for XML, so the encoder walks
//! the value tree itself and checks [`included_by_group`] for every field:
//!
//! - the root element is named after the root type (`list` for a root list,
//!   `map` for a root map, `value` for a root scalar);
//! - a struct field becomes a child element named after the field;
//! - a list becomes one container element with a child per item, named after
//!   the item type for structs and `item` otherwise;
//! - a map becomes `<entry><key>..</key><value>..</value></entry>` children;
//! - scalars become text, `null` values are omitted.
//!
//! A field or type name that is not a valid unprefixed XML name fails the
//! whole encode with [`ViewError::Encode`]; nothing is written.
//!
//! Decoding reverses this layout, guided by the declared kinds. Unknown
//! elements are ignored.

use serde_json::{Map, Value};
use xot::{Node, Xot};

use super::{parse_text, scalar_text};
use crate::cache::ShapeCache;
use crate::convert::json_kind;
use crate::error::{Result, ViewError};
use crate::groups::{included_by_group, GroupSet};
use crate::metadata::{short_type_name, FieldKind};

pub fn encode(
    value: &Value,
    root: &FieldKind,
    groups: &GroupSet,
    cache: &ShapeCache,
) -> Result<Vec<u8>> {
    let mut writer = Writer {
        xot: Xot::new(),
        cache,
        groups,
    };
    let element = writer.new_element(&root_name(root))?;
    writer.write(element, value, root)?;
    let document = writer
        .xot
        .new_document_with_element(element)
        .map_err(encode_error)?;
    let text = writer.xot.to_string(document).map_err(encode_error)?;
    Ok(text.into_bytes())
}

pub fn decode(bytes: &[u8], root: &FieldKind, cache: &ShapeCache) -> Result<Value> {
    let text = std::str::from_utf8(bytes).map_err(|e| ViewError::Schema(e.to_string()))?;
    let mut xot = Xot::new();
    let document = xot
        .parse(text)
        .map_err(|e| ViewError::Schema(format!("invalid XML: {e}")))?;
    let element = xot
        .document_element(document)
        .map_err(|e| ViewError::Schema(e.to_string()))?;
    Reader { xot: &xot, cache }
        .read(element, root)
        .map_err(ViewError::into_schema)
}

fn root_name(kind: &FieldKind) -> String {
    match kind.unwrap_pointer() {
        FieldKind::Struct(schema) => short_type_name(schema.type_name()).to_string(),
        FieldKind::List(_) => "list".to_string(),
        FieldKind::Map(_) => "map".to_string(),
        FieldKind::Scalar(_) | FieldKind::Pointer(_) => "value".to_string(),
    }
}

fn item_name(kind: &FieldKind) -> String {
    match kind.unwrap_pointer() {
        FieldKind::Struct(schema) => short_type_name(schema.type_name()).to_string(),
        _ => "item".to_string(),
    }
}

/// Unprefixed XML name: a letter or `_`, then letters, digits, `-`, `_`
/// or `.`.
fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn encode_error(err: impl std::fmt::Display) -> ViewError {
    ViewError::Encode(format!("XML: {err}"))
}

struct Writer<'a> {
    xot: Xot,
    cache: &'a ShapeCache,
    groups: &'a GroupSet,
}

impl Writer<'_> {
    fn new_element(&mut self, name: &str) -> Result<Node> {
        if !is_element_name(name) {
            return Err(encode_error(format!("invalid element name {name:?}")));
        }
        let name = self.xot.add_name(name);
        Ok(self.xot.new_element(name))
    }

    fn append_element(&mut self, parent: Node, name: &str) -> Result<Node> {
        let element = self.new_element(name)?;
        self.xot.append(parent, element).map_err(encode_error)?;
        Ok(element)
    }

    fn append_text(&mut self, parent: Node, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let node = self.xot.new_text(text);
        self.xot.append(parent, node).map_err(encode_error)
    }

    fn write(&mut self, parent: Node, value: &Value, kind: &FieldKind) -> Result<()> {
        match (kind, value) {
            (_, Value::Null) => Ok(()),
            (FieldKind::Pointer(inner), _) => self.write(parent, value, inner),
            (FieldKind::Scalar(_), _) => self.append_text(parent, &scalar_text(value, kind)),
            (FieldKind::Struct(schema), Value::Object(map)) => {
                let shape = self.cache.get_or_build(schema, &GroupSet::none());
                for field in shape.fields() {
                    if !included_by_group(field, self.groups) {
                        continue;
                    }
                    let Some(child) = map.get(&field.name).filter(|v| !v.is_null()) else {
                        continue;
                    };
                    let element = self.append_element(parent, &field.name)?;
                    self.write(element, child, &field.kind)
                        .map_err(|e| e.within(&field.name))?;
                }
                Ok(())
            }
            (FieldKind::List(elem), Value::Array(items)) => {
                let name = item_name(elem);
                for (i, item) in items.iter().enumerate() {
                    if item.is_null() {
                        continue;
                    }
                    let element = self.append_element(parent, &name)?;
                    self.write(element, item, elem)
                        .map_err(|e| e.within(&format!("[{i}]")))?;
                }
                Ok(())
            }
            (FieldKind::Map(inner), Value::Object(map)) => {
                for (key, item) in map {
                    let entry = self.append_element(parent, "entry")?;
                    let key_element = self.append_element(entry, "key")?;
                    self.append_text(key_element, key)?;
                    if !item.is_null() {
                        let value_element = self.append_element(entry, "value")?;
                        self.write(value_element, item, inner)
                            .map_err(|e| e.within(key))?;
                    }
                }
                Ok(())
            }
            _ => Err(ViewError::shape(
                "",
                format!("expected {}, found {}", kind.label(), json_kind(value)),
            )),
        }
    }
}

struct Reader<'a> {
    xot: &'a Xot,
    cache: &'a ShapeCache,
}

impl<'a> Reader<'a> {
    fn elements(&self, node: Node) -> Vec<Node> {
        self.xot
            .children(node)
            .filter(|child| self.xot.is_element(*child))
            .collect()
    }

    fn name(&self, node: Node) -> &'a str {
        self.xot
            .element(node)
            .map(|element| self.xot.local_name_str(element.name()))
            .unwrap_or("")
    }

    fn text(&self, node: Node) -> String {
        self.xot
            .children(node)
            .filter_map(|child| self.xot.text_str(child))
            .collect()
    }

    fn read(&self, node: Node, kind: &FieldKind) -> Result<Value> {
        match kind {
            FieldKind::Pointer(inner) => self.read(node, inner),
            FieldKind::Scalar(_) => parse_text(&self.text(node), kind),
            FieldKind::Struct(schema) => {
                let shape = self.cache.get_or_build(schema, &GroupSet::none());
                let mut out = Map::new();
                for child in self.elements(node) {
                    let name = self.name(child);
                    let Some(field) = shape.field(name) else {
                        continue;
                    };
                    let value = self
                        .read(child, &field.kind)
                        .map_err(|e| e.within(name))?;
                    out.insert(name.to_string(), value);
                }
                Ok(Value::Object(out))
            }
            FieldKind::List(elem) => self
                .elements(node)
                .into_iter()
                .enumerate()
                .map(|(i, child)| {
                    self.read(child, elem)
                        .map_err(|e| e.within(&format!("[{i}]")))
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            FieldKind::Map(inner) => {
                let mut out = Map::new();
                for entry in self.elements(node) {
                    let mut key = None;
                    let mut value = Value::Null;
                    for part in self.elements(entry) {
                        match self.name(part) {
                            "key" => key = Some(self.text(part)),
                            "value" => value = self.read(part, inner)?,
                            _ => {}
                        }
                    }
                    let key = key.ok_or_else(|| ViewError::shape("", "map entry without key"))?;
                    out.insert(key, value);
                }
                Ok(Value::Object(out))
            }
        }
    }
}
