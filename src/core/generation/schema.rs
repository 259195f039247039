//! Schema contract: shape validation and instance validation.
//!
//! A [`Schema`] is a draft-07 JSON Schema describing one content kind,
//! extended with a `ui_order` integer on every property that pins the
//! display/output ordering. Schemas are LLM-authored, so the contract is
//! enforced at construction: a `Schema` value cannot exist unless its
//! document passed every shape rule.
//!
//! Shape rules (checked by [`validate_shape`]):
//! - top-level `type` is `object`
//! - `additionalProperties` is exactly `false`
//! - `name` and `description` exist and are required
//! - every property carries an integer `ui_order`
//! - `name` has `ui_order` 1 and `description` has `ui_order` 2
//! - the `ui_order` values form the exact set `{1..k}`

use std::fmt;

use jsonschema::{Draft, JSONSchema};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::core::generation::error::GenerationError;

/// A shape rule the schema document violated.
///
/// One variant per rule so rejections are logged with the specific failure,
/// and so the message can be echoed back to the model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeViolation {
    #[error("schema must be a JSON object")]
    NotAnObject,

    #[error("schema must declare type=object")]
    WrongTopLevelType,

    #[error("schema must set additionalProperties=false")]
    AdditionalPropertiesAllowed,

    #[error("schema must define a '{0}' property")]
    MissingCoreProperty(String),

    #[error("'{0}' must be listed in required")]
    CoreNotRequired(String),

    #[error("property '{property}' is missing ui_order")]
    MissingUiOrder { property: String },

    #[error("property '{property}' has a non-integer ui_order")]
    NonIntegerUiOrder { property: String },

    #[error("'name' must have ui_order=1 and 'description' ui_order=2")]
    CorePropertiesNotPinned,

    #[error("ui_order must form a continuous sequence starting at 1; found {found} at '{property}' where {expected} was expected")]
    NonContiguousUiOrder {
        property: String,
        found: i64,
        expected: i64,
    },

    #[error("schema is not a valid draft-07 document: {0}")]
    InvalidDocument(String),
}

/// Structural pre-check of a schema document itself.
pub fn validate_shape(schema: &Value) -> Result<(), ShapeViolation> {
    let root = schema.as_object().ok_or(ShapeViolation::NotAnObject)?;

    if root.get("type").and_then(Value::as_str) != Some("object") {
        return Err(ShapeViolation::WrongTopLevelType);
    }

    if root.get("additionalProperties") != Some(&Value::Bool(false)) {
        return Err(ShapeViolation::AdditionalPropertiesAllowed);
    }

    let properties = root
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| ShapeViolation::MissingCoreProperty("name".to_string()))?;

    for core in ["name", "description"] {
        if !properties.contains_key(core) {
            return Err(ShapeViolation::MissingCoreProperty(core.to_string()));
        }
    }

    let required: Vec<&str> = root
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    for core in ["name", "description"] {
        if !required.contains(&core) {
            return Err(ShapeViolation::CoreNotRequired(core.to_string()));
        }
    }

    let mut orders: Vec<(i64, &String)> = Vec::with_capacity(properties.len());
    for (prop_name, prop_def) in properties {
        let ui_order = prop_def.get("ui_order").ok_or_else(|| {
            ShapeViolation::MissingUiOrder {
                property: prop_name.clone(),
            }
        })?;
        let value = ui_order
            .as_i64()
            .ok_or_else(|| ShapeViolation::NonIntegerUiOrder {
                property: prop_name.clone(),
            })?;
        orders.push((value, prop_name));
    }

    let ui_of = |name: &str| {
        properties
            .get(name)
            .and_then(|d| d.get("ui_order"))
            .and_then(Value::as_i64)
    };
    if ui_of("name") != Some(1) || ui_of("description") != Some(2) {
        return Err(ShapeViolation::CorePropertiesNotPinned);
    }

    orders.sort_by_key(|(ui, _)| *ui);
    for (i, (ui, prop_name)) in orders.iter().enumerate() {
        let expected = i as i64 + 1;
        if *ui != expected {
            return Err(ShapeViolation::NonContiguousUiOrder {
                property: (*prop_name).clone(),
                found: *ui,
                expected,
            });
        }
    }

    Ok(())
}

/// A shape-validated, compiled schema. Immutable once constructed.
pub struct Schema {
    raw: Value,
    compiled: JSONSchema,
}

impl Schema {
    /// Validate the document's shape and compile it for instance validation.
    pub fn new(raw: Value) -> Result<Self, ShapeViolation> {
        validate_shape(&raw)?;
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&raw)
            .map_err(|e| ShapeViolation::InvalidDocument(e.to_string()))?;
        Ok(Self { raw, compiled })
    }

    /// The hard-coded minimal fallback: name/description only, closed object.
    pub fn minimal() -> Self {
        let raw = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "name": { "type": "string", "ui_order": 1 },
                "description": { "type": "string", "ui_order": 2 }
            },
            "required": ["name", "description"],
            "additionalProperties": false
        });
        Self::new(raw).expect("minimal fallback schema is valid by construction")
    }

    /// Validate a data instance against this schema (draft-07).
    pub fn validate_instance(&self, data: &Value) -> Result<(), GenerationError> {
        if let Err(errors) = self.compiled.validate(data) {
            let reason = errors
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(GenerationError::SchemaViolation { reason });
        }
        Ok(())
    }

    /// Property (name, definition) pairs sorted by ascending `ui_order`.
    pub fn properties_by_ui_order(&self) -> Vec<(&String, &Value)> {
        let mut props: Vec<(&String, &Value)> = self
            .raw
            .get("properties")
            .and_then(Value::as_object)
            .map(Map::iter)
            .map(|iter| iter.collect())
            .unwrap_or_default();
        props.sort_by_key(|(_, def)| def.get("ui_order").and_then(Value::as_i64).unwrap_or(i64::MAX));
        props
    }

    /// The raw schema document.
    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    /// Compact JSON serialization for embedding into prompts.
    pub fn to_json_string(&self) -> String {
        self.raw.to_string()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema").field("raw", &self.raw).finish()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weapon_schema() -> Value {
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "name": { "type": "string", "ui_order": 1 },
                "description": { "type": "string", "ui_order": 2 },
                "damage": { "type": "string", "ui_order": 3 },
                "cost": { "type": "integer", "ui_order": 4 }
            },
            "required": ["name", "description"],
            "additionalProperties": false
        })
    }

    #[test]
    fn test_valid_schema_accepted() {
        assert!(validate_shape(&weapon_schema()).is_ok());
        assert!(Schema::new(weapon_schema()).is_ok());
    }

    #[test]
    fn test_minimal_fallback_is_valid() {
        let schema = Schema::minimal();
        assert_eq!(schema.properties_by_ui_order().len(), 2);
    }

    #[test]
    fn test_rejects_missing_additional_properties() {
        let mut schema = weapon_schema();
        schema.as_object_mut().unwrap().remove("additionalProperties");
        assert_eq!(
            validate_shape(&schema),
            Err(ShapeViolation::AdditionalPropertiesAllowed)
        );
    }

    #[test]
    fn test_rejects_additional_properties_true() {
        let mut schema = weapon_schema();
        schema["additionalProperties"] = json!(true);
        assert_eq!(
            validate_shape(&schema),
            Err(ShapeViolation::AdditionalPropertiesAllowed)
        );
    }

    #[test]
    fn test_rejects_missing_description_property() {
        let mut schema = weapon_schema();
        schema["properties"].as_object_mut().unwrap().remove("description");
        assert_eq!(
            validate_shape(&schema),
            Err(ShapeViolation::MissingCoreProperty("description".to_string()))
        );
    }

    #[test]
    fn test_rejects_name_not_required() {
        let mut schema = weapon_schema();
        schema["required"] = json!(["description"]);
        assert_eq!(
            validate_shape(&schema),
            Err(ShapeViolation::CoreNotRequired("name".to_string()))
        );
    }

    #[test]
    fn test_rejects_missing_ui_order() {
        let mut schema = weapon_schema();
        schema["properties"]["damage"].as_object_mut().unwrap().remove("ui_order");
        assert_eq!(
            validate_shape(&schema),
            Err(ShapeViolation::MissingUiOrder {
                property: "damage".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_non_integer_ui_order() {
        let mut schema = weapon_schema();
        schema["properties"]["damage"]["ui_order"] = json!("3");
        assert_eq!(
            validate_shape(&schema),
            Err(ShapeViolation::NonIntegerUiOrder {
                property: "damage".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_fractional_ui_order() {
        let mut schema = weapon_schema();
        schema["properties"]["damage"]["ui_order"] = json!(3.5);
        assert_eq!(
            validate_shape(&schema),
            Err(ShapeViolation::NonIntegerUiOrder {
                property: "damage".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_unpinned_name() {
        let mut schema = weapon_schema();
        schema["properties"]["name"]["ui_order"] = json!(3);
        schema["properties"]["damage"]["ui_order"] = json!(1);
        assert_eq!(
            validate_shape(&schema),
            Err(ShapeViolation::CorePropertiesNotPinned)
        );
    }

    #[test]
    fn test_rejects_gap_in_ui_order() {
        let mut schema = weapon_schema();
        schema["properties"]["cost"]["ui_order"] = json!(5);
        assert!(matches!(
            validate_shape(&schema),
            Err(ShapeViolation::NonContiguousUiOrder { found: 5, .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_ui_order() {
        let mut schema = weapon_schema();
        schema["properties"]["cost"]["ui_order"] = json!(3);
        assert!(matches!(
            validate_shape(&schema),
            Err(ShapeViolation::NonContiguousUiOrder { .. })
        ));
    }

    #[test]
    fn test_rejects_wrong_top_level_type() {
        let mut schema = weapon_schema();
        schema["type"] = json!("array");
        assert_eq!(validate_shape(&schema), Err(ShapeViolation::WrongTopLevelType));
    }

    #[test]
    fn test_rejects_non_object_document() {
        assert_eq!(validate_shape(&json!([1, 2])), Err(ShapeViolation::NotAnObject));
    }

    #[test]
    fn test_properties_sorted_by_ui_order() {
        // Declaration order deliberately scrambled relative to ui_order.
        let schema = Schema::new(json!({
            "type": "object",
            "properties": {
                "cost": { "type": "integer", "ui_order": 4 },
                "description": { "type": "string", "ui_order": 2 },
                "name": { "type": "string", "ui_order": 1 },
                "damage": { "type": "string", "ui_order": 3 }
            },
            "required": ["name", "description"],
            "additionalProperties": false
        }))
        .unwrap();

        let names: Vec<&str> = schema
            .properties_by_ui_order()
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(names, vec!["name", "description", "damage", "cost"]);
    }

    #[test]
    fn test_validate_instance_accepts_conformant_object() {
        let schema = Schema::new(weapon_schema()).unwrap();
        let data = json!({
            "name": "Frost Axe",
            "description": "An axe rimed with hoarfrost.",
            "damage": "1d8 cold",
            "cost": 120
        });
        assert!(schema.validate_instance(&data).is_ok());
    }

    #[test]
    fn test_validate_instance_rejects_missing_required() {
        let schema = Schema::new(weapon_schema()).unwrap();
        let data = json!({ "name": "Frost Axe" });
        let err = schema.validate_instance(&data).unwrap_err();
        assert!(err.to_string().contains("description"));
    }

    #[test]
    fn test_validate_instance_rejects_additional_property() {
        let schema = Schema::new(weapon_schema()).unwrap();
        let data = json!({
            "name": "Frost Axe",
            "description": "Cold.",
            "rarity": "rare"
        });
        assert!(schema.validate_instance(&data).is_err());
    }

    #[test]
    fn test_validate_instance_rejects_wrong_type() {
        let schema = Schema::new(weapon_schema()).unwrap();
        let data = json!({
            "name": "Frost Axe",
            "description": "Cold.",
            "cost": "a lot"
        });
        let err = schema.validate_instance(&data).unwrap_err();
        assert!(err.to_string().contains("integer") || err.to_string().contains("type"));
    }
}
