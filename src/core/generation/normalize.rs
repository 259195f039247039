//! Normalization of validated objects into display-ready records.
//!
//! A [`NormalizedRecord`] is an ordered mapping from human-friendly display
//! key to flattened plaintext value. Field order follows the schema's
//! `ui_order`, with Name and Description forced to the front when both are
//! present. The contract already pins them to 1/2, but normalization does
//! not depend on that silently holding.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::generation::schema::Schema;

/// An ordered, flattened, display-ready record. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    fields: IndexMap<String, String>,
}

impl NormalizedRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Display keys in record order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Convert a schema-validated object into a [`NormalizedRecord`].
pub fn normalize(data: &Value, schema: &Schema) -> NormalizedRecord {
    let mut fields = IndexMap::new();

    for (prop_name, _def) in schema.properties_by_ui_order() {
        let value = data
            .get(prop_name)
            .map(flatten)
            .unwrap_or_default();
        fields.insert(display_key(prop_name), value);
    }

    // Re-place Name/Description at the front even if ui_order didn't.
    if fields.contains_key("Name") && fields.contains_key("Description") {
        let mut reordered = IndexMap::with_capacity(fields.len());
        for key in ["Name", "Description"] {
            if let Some(value) = fields.shift_remove(key) {
                reordered.insert(key.to_string(), value);
            }
        }
        reordered.extend(fields);
        fields = reordered;
    }

    NormalizedRecord { fields }
}

/// Flatten any JSON value to a single plaintext string.
///
/// Objects render as `Key: value; Key: value`, arrays as comma-joined
/// flattenings, scalars via their natural string form.
fn flatten(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(flatten)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", title_case(k), flatten(v)))
            .collect::<Vec<_>>()
            .join("; "),
    }
}

/// Human-friendly display key: underscores to spaces, title-cased.
fn display_key(name: &str) -> String {
    title_case(&name.replace('_', " "))
}

/// Capitalize the first letter of every alphabetic run, lowercase the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
