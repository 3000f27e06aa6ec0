//! Detail-record projection, item identity, and merge.
//!
//! A [`DetailRecord`] is the allow-listed subset of a per-item detail
//! response. [`merge`] folds it into a base item's `properties` object
//! key by key and never touches any other top-level member.

use serde_json::{Map, Value};

pub type DetailRecord = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSpec {
    /// Key inside `properties` holding the item's stable identity.
    pub id_field: String,
    /// Detail fields worth keeping; everything else is dropped.
    pub detail_keys: Vec<String>,
}

impl DetailSpec {
    /// Keep only allow-listed keys. Arrays of objects are reduced to
    /// the `name` of each element. The identity field is never carried
    /// over, so merging cannot rewrite an item's identity.
    #[must_use]
    pub fn project(&self, detail: &Value) -> DetailRecord {
        let mut record = DetailRecord::new();
        let Some(fields) = detail.as_object() else {
            return record;
        };
        for key in self.detail_keys.iter().filter(|k| **k != self.id_field) {
            if let Some(value) = fields.get(key) {
                record.insert(key.clone(), project_value(value));
            }
        }
        record
    }
}

fn project_value(value: &Value) -> Value {
    match value {
        Value::Array(elements) if elements.iter().any(Value::is_object) => Value::Array(
            elements
                .iter()
                .filter_map(|e| e.get("name").and_then(Value::as_str))
                .filter(|name| !name.is_empty())
                .map(|name| Value::String(name.to_string()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Identity of `item`, read from `properties[id_field]`.
///
/// Strings and numbers qualify; empty strings, nulls, and anything else
/// mean the item cannot be looked up.
#[must_use]
pub fn item_identity(item: &Value, id_field: &str) -> Option<String> {
    match item.get("properties")?.get(id_field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Merge `record` into `item["properties"]`. Returns whether the item
/// could hold properties at all.
pub fn merge(item: &mut Value, record: &DetailRecord) -> bool {
    let Some(properties) = properties_mut(item, !record.is_empty()) else {
        return false;
    };
    for (key, value) in record {
        properties.insert(key.clone(), value.clone());
    }
    true
}

/// Write a single property, creating the `properties` object if needed.
pub fn set_property(item: &mut Value, key: &str, value: Value) -> bool {
    let Some(properties) = properties_mut(item, true) else {
        return false;
    };
    properties.insert(key.to_string(), value);
    true
}

fn properties_mut(item: &mut Value, create: bool) -> Option<&mut Map<String, Value>> {
    let object = item.as_object_mut()?;
    let missing = matches!(object.get("properties"), None | Some(Value::Null));
    if missing {
        if !create {
            return None;
        }
        object.insert("properties".to_string(), Value::Object(Map::new()));
    }
    object.get_mut("properties")?.as_object_mut()
}
