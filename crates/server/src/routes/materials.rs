use crate::error::{ServerError, ServerResult};
use crate::routes::payload::{ImageSource, MaterialPayload};
use crate::state::ServerState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use store::{Caster, Material, MaterialDraft, Projection};

/// Confirmation body for deletes
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// List every material without its image reference.
pub async fn list_materials(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<Json<Vec<Material>>> {
    let materials = state
        .store
        .list(Projection::WithoutImage)
        .await
        .map_err(ServerError::read)?;
    Ok(Json(materials))
}

/// Fetch one material including its image reference.
pub async fn get_material(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<Material>> {
    state
        .store
        .get(&id)
        .await
        .map_err(ServerError::read)?
        .map(Json)
        .ok_or_else(ServerError::material_not_found)
}

/// Create a material from a multipart form or a JSON object.
///
/// An `image` file part is stored under the upload directory and its public
/// path recorded as `imageUrl`; otherwise any supplied `imageUrl` is kept
/// verbatim.
pub async fn create_material(
    State(state): State<Arc<ServerState>>,
    mut payload: MaterialPayload,
) -> ServerResult<(StatusCode, Json<Material>)> {
    let image_url = match payload.take_image() {
        ImageSource::Uploaded(file) => Some(Value::String(
            state.uploads.save(&file.file_name, &file.bytes).await?,
        )),
        ImageSource::Provided(value) => Some(value),
        ImageSource::Absent => None,
    };

    let mut caster = Caster::new();
    let draft = MaterialDraft {
        name: caster.text("name", payload.field("name")),
        technology: caster.text("technology", payload.field("technology")),
        colors: normalize_colors(payload.field("colors")),
        price_per_gram: caster.number("pricePerGram", payload.field("pricePerGram")),
        image_url: caster.text("imageUrl", image_url.as_ref()),
    };
    caster.finish().map_err(ServerError::write)?;

    let created = state.store.insert(draft).await.map_err(ServerError::write)?;
    tracing::info!(id = %created.id, "material created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// Merge the supplied fields into an existing material.
///
/// Only truthy values replace what is stored: an empty string, `0`, `false`
/// or `null` leaves the previous value in place.
pub async fn update_material(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    mut payload: MaterialPayload,
) -> ServerResult<Json<Material>> {
    let mut material = state
        .store
        .get(&id)
        .await
        .map_err(ServerError::write)?
        .ok_or_else(ServerError::material_not_found)?;

    let mut caster = Caster::new();
    let image = payload.take_image();
    apply_update(&mut material, &payload, &mut caster);

    match image {
        ImageSource::Uploaded(file) => {
            material.image_url = Some(state.uploads.save(&file.file_name, &file.bytes).await?);
        }
        ImageSource::Provided(value) if is_truthy(&value) => {
            material.image_url = caster.text("imageUrl", Some(&value));
        }
        ImageSource::Provided(_) | ImageSource::Absent => {}
    }
    caster.finish().map_err(ServerError::write)?;

    state
        .store
        .replace(&material)
        .await
        .map_err(ServerError::write)?;
    tracing::info!(id = %material.id, "material updated");

    Ok(Json(material))
}

/// Remove a material. The record is looked up first so unknown ids yield 404.
pub async fn delete_material(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<MessageResponse>> {
    if state
        .store
        .get(&id)
        .await
        .map_err(ServerError::read)?
        .is_none()
    {
        return Err(ServerError::material_not_found());
    }

    state.store.delete(&id).await.map_err(ServerError::read)?;
    tracing::info!(id = %id, "material deleted");

    Ok(Json(MessageResponse {
        message: "Material deleted".to_string(),
    }))
}

/// Apply the text, color and price fields of an update payload.
pub fn apply_update(material: &mut Material, payload: &MaterialPayload, caster: &mut Caster) {
    if let Some(value) = truthy(payload.field("name")) {
        material.name = caster.text("name", Some(value));
    }
    if let Some(value) = truthy(payload.field("technology")) {
        material.technology = caster.text("technology", Some(value));
    }
    if let Some(value) = truthy(payload.field("colors")) {
        material.colors = normalize_colors(Some(value));
    }
    if let Some(value) = truthy(payload.field("pricePerGram")) {
        material.price_per_gram = caster.number("pricePerGram", Some(value));
    }
}

/// Accept colors either as a list or as one comma separated string.
///
/// Lists pass through unchanged (non-text entries are stringified, nulls
/// dropped); a string is split on `,` with each piece trimmed; anything
/// else yields an empty list.
pub fn normalize_colors(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) => s.split(',').map(|c| c.trim().to_string()).collect(),
        _ => Vec::new(),
    }
}

/// Loose truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| is_truthy(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn existing() -> Material {
        Material {
            id: "65f000000000000000000001".into(),
            name: Some("PLA".into()),
            technology: Some("FDM".into()),
            colors: vec!["red".into(), "blue".into()],
            price_per_gram: Some(0.05),
            image_url: Some("/uploads/1.png".into()),
        }
    }

    fn payload(value: Value) -> MaterialPayload {
        MaterialPayload::from_json(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn colors_from_comma_string() {
        assert_eq!(
            normalize_colors(Some(&json!("red, blue,green"))),
            vec!["red", "blue", "green"]
        );
    }

    #[test]
    fn colors_list_passes_through() {
        assert_eq!(
            normalize_colors(Some(&json!(["red", "blue"]))),
            vec!["red", "blue"]
        );
    }

    #[test]
    fn colors_other_inputs_are_empty() {
        assert!(normalize_colors(None).is_empty());
        assert!(normalize_colors(Some(&json!(null))).is_empty());
        assert!(normalize_colors(Some(&json!(42))).is_empty());
        assert!(normalize_colors(Some(&json!({"c": "red"}))).is_empty());
    }

    #[test]
    fn truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!("0"), json!(1), json!(true), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn update_changes_only_supplied_fields() {
        let mut material = existing();
        let mut caster = Caster::new();
        apply_update(&mut material, &payload(json!({"technology": "resin"})), &mut caster);
        caster.finish().unwrap();

        let expected = Material {
            technology: Some("resin".into()),
            ..existing()
        };
        assert_eq!(material, expected);
    }

    #[test]
    fn falsy_values_keep_previous_values() {
        let mut material = existing();
        let mut caster = Caster::new();
        apply_update(
            &mut material,
            &payload(json!({"name": "", "pricePerGram": 0, "colors": "", "technology": null})),
            &mut caster,
        );
        caster.finish().unwrap();
        assert_eq!(material, existing());
    }

    #[test]
    fn numeric_string_zero_is_a_replacement() {
        let mut material = existing();
        let mut caster = Caster::new();
        apply_update(&mut material, &payload(json!({"pricePerGram": "0"})), &mut caster);
        caster.finish().unwrap();
        assert_eq!(material.price_per_gram, Some(0.0));
    }

    #[test]
    fn empty_color_list_clears_colors() {
        let mut material = existing();
        let mut caster = Caster::new();
        apply_update(&mut material, &payload(json!({"colors": []})), &mut caster);
        assert!(material.colors.is_empty());
    }

    #[test]
    fn bad_price_is_reported() {
        let mut material = existing();
        let mut caster = Caster::new();
        apply_update(&mut material, &payload(json!({"pricePerGram": "cheap"})), &mut caster);
        let err = caster.finish().unwrap_err();
        assert!(err.to_string().contains("Cast to Number failed for value \"cheap\""));
    }
}
