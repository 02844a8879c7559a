//! Material record types and the field casting rules applied before a write.

use crate::StoreError;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Model name used in store error messages.
pub const MODEL_NAME: &str = "Material";

/// A persisted material record.
///
/// Serializes with the `_id` key and camelCase field names; absent optional
/// fields are omitted from the JSON output entirely.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_gram: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Material {
    /// Copy of this record with the image reference dropped, as served by list views.
    pub fn without_image(&self) -> Self {
        Self {
            image_url: None,
            ..self.clone()
        }
    }
}

/// Field values for a record that has not been assigned an identifier yet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialDraft {
    pub name: Option<String>,
    pub technology: Option<String>,
    pub colors: Vec<String>,
    pub price_per_gram: Option<f64>,
    pub image_url: Option<String>,
}

impl MaterialDraft {
    pub fn into_material(self, id: ObjectId) -> Material {
        Material {
            id: id.to_hex(),
            name: self.name,
            technology: self.technology,
            colors: self.colors,
            price_per_gram: self.price_per_gram,
            image_url: self.image_url,
        }
    }
}

/// Which fields a read should return.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Full,
    /// Every field except `imageUrl`.
    WithoutImage,
}

/// Parse a client-supplied identifier into an ObjectId.
pub fn parse_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

/// Casts loosely typed client values to the declared field types, collecting
/// every failure so they can be reported together.
#[derive(Debug, Default)]
pub struct Caster {
    errors: Vec<String>,
}

impl Caster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cast to text. `null` and absent values yield `None`.
    pub fn text(&mut self, path: &str, value: Option<&Value>) -> Option<String> {
        match value? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => {
                self.fail("String", path, other);
                None
            }
        }
    }

    /// Cast to a finite number. Empty strings yield `None`.
    pub fn number(&mut self, path: &str, value: Option<&Value>) -> Option<f64> {
        let value = value?;
        let parsed = match value {
            Value::Null => return None,
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) if s.is_empty() => return None,
            // Blank but non-empty text reads as zero, like a numeric form input.
            Value::String(s) if s.trim().is_empty() => Some(0.0),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if n.is_finite() => Some(n),
            _ => {
                self.fail("Number", path, value);
                None
            }
        }
    }

    /// Consume the caster, returning a validation error if any cast failed.
    pub fn finish(self) -> Result<(), StoreError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(StoreError::Validation(format!(
            "{MODEL_NAME} validation failed: {}",
            self.errors.join(", ")
        )))
    }

    fn fail(&mut self, kind: &str, path: &str, value: &Value) {
        let shown = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.errors.push(format!(
            "{path}: Cast to {kind} failed for value \"{shown}\" (type {}) at path \"{path}\"",
            type_name(value)
        ));
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_accepts_numeric_strings() {
        let mut caster = Caster::new();
        assert_eq!(caster.number("pricePerGram", Some(&json!(" 0.25 "))), Some(0.25));
        assert_eq!(caster.number("pricePerGram", Some(&json!(3))), Some(3.0));
        assert_eq!(caster.number("pricePerGram", Some(&json!(true))), Some(1.0));
        assert_eq!(caster.number("pricePerGram", Some(&json!(""))), None);
        assert_eq!(caster.number("pricePerGram", None), None);
        assert!(caster.finish().is_ok());
    }

    #[test]
    fn blank_price_casts_to_zero() {
        let mut caster = Caster::new();
        assert_eq!(caster.number("pricePerGram", Some(&json!("  "))), Some(0.0));
        assert_eq!(caster.number("pricePerGram", Some(&json!("\t"))), Some(0.0));
        assert!(caster.finish().is_ok());
    }

    #[test]
    fn number_rejects_garbage() {
        let mut caster = Caster::new();
        assert_eq!(caster.number("pricePerGram", Some(&json!("abc"))), None);
        let err = caster.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Material validation failed: pricePerGram: Cast to Number failed for value \"abc\" (type string) at path \"pricePerGram\""
        );
    }

    #[test]
    fn number_rejects_non_finite() {
        let mut caster = Caster::new();
        caster.number("pricePerGram", Some(&json!("inf")));
        assert!(matches!(caster.finish(), Err(StoreError::Validation(_))));
    }

    #[test]
    fn text_stringifies_scalars_and_rejects_objects() {
        let mut caster = Caster::new();
        assert_eq!(caster.text("name", Some(&json!(12))), Some("12".into()));
        assert_eq!(caster.text("name", Some(&json!(null))), None);
        assert_eq!(caster.text("technology", Some(&json!({"a": 1}))), None);
        assert_eq!(caster.text("name", Some(&json!([1]))), None);

        let msg = caster.finish().unwrap_err().to_string();
        assert!(msg.contains("technology: Cast to String failed"));
        assert!(msg.contains("(type Array) at path \"name\""));
    }

    #[test]
    fn serializes_with_id_key_and_skips_absent_fields() {
        let material = MaterialDraft {
            name: Some("PLA".into()),
            colors: vec!["red".into()],
            ..Default::default()
        }
        .into_material(ObjectId::new());

        let value = serde_json::to_value(&material).unwrap();
        assert_eq!(value["_id"], json!(material.id));
        assert_eq!(value["colors"], json!(["red"]));
        assert!(value.get("imageUrl").is_none());
        assert!(value.get("pricePerGram").is_none());
    }

    #[test]
    fn parse_id_rejects_short_ids() {
        assert!(parse_id("123").is_err());
        assert!(parse_id(&ObjectId::new().to_hex()).is_ok());
    }
}
