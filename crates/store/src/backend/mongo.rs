//! MongoDB backend for the material collection.
//!
//! Records are stored one document per material with a native ObjectId
//! `_id`, matching the layout written by other clients of the same
//! collection. Extra fields already present on documents (such as a version
//! key) are ignored when reading.
//!
//! # Configuration Example
//! ```yaml
//! mongodb_uri: "mongodb://localhost:27017/materials"
//! collection: "materials"
//! ```

use crate::model::{parse_id, Material, MaterialDraft, Projection};
use crate::{MaterialStore, StoreError};
use async_trait::async_trait;
use bson::oid::ObjectId;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

/// Database used when neither the configuration nor the URI names one.
pub const DEFAULT_DATABASE: &str = "test";

/// Collection holding material documents.
pub const DEFAULT_COLLECTION: &str = "materials";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct MaterialDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    technology: Option<String>,
    #[serde(default)]
    colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    price_per_gram: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

impl MaterialDocument {
    fn from_material(material: &Material) -> Result<Self, StoreError> {
        Ok(Self {
            id: parse_id(&material.id)?,
            name: material.name.clone(),
            technology: material.technology.clone(),
            colors: material.colors.clone(),
            price_per_gram: material.price_per_gram,
            image_url: material.image_url.clone(),
        })
    }
}

impl From<MaterialDocument> for Material {
    fn from(doc: MaterialDocument) -> Self {
        Material {
            id: doc.id.to_hex(),
            name: doc.name,
            technology: doc.technology,
            colors: doc.colors,
            price_per_gram: doc.price_per_gram,
            image_url: doc.image_url,
        }
    }
}

/// MongoDB-backed [`MaterialStore`].
///
/// The driver keeps its own connection pool, so one instance is shared by
/// every request handler.
pub struct MongoBackend {
    client: Client,
    database: String,
    collection: Collection<MaterialDocument>,
}

impl MongoBackend {
    /// Parse `uri` and build a client. No round trip to the server happens here.
    pub async fn connect(
        uri: &str,
        database: Option<&str>,
        collection: Option<&str>,
    ) -> Result<Self, StoreError> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(StoreError::connection)?;
        let database = database
            .map(str::to_owned)
            .or_else(|| options.default_database.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let client = Client::with_options(options).map_err(StoreError::connection)?;
        let collection = client
            .database(&database)
            .collection::<MaterialDocument>(collection.unwrap_or(DEFAULT_COLLECTION));

        tracing::debug!(database = %database, collection = %collection.name(), "mongo client ready");

        Ok(Self {
            client,
            database,
            collection,
        })
    }
}

#[async_trait]
impl MaterialStore for MongoBackend {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn insert(&self, draft: MaterialDraft) -> Result<Material, StoreError> {
        let material = draft.into_material(ObjectId::new());
        let document = MaterialDocument::from_material(&material)?;
        self.collection
            .insert_one(&document, None)
            .await
            .map_err(StoreError::backend)?;
        Ok(material)
    }

    async fn list(&self, projection: Projection) -> Result<Vec<Material>, StoreError> {
        let options = match projection {
            Projection::Full => None,
            Projection::WithoutImage => Some(
                FindOptions::builder()
                    .projection(doc! { "imageUrl": 0 })
                    .build(),
            ),
        };
        let cursor = self
            .collection
            .find(None, options)
            .await
            .map_err(StoreError::backend)?;
        let documents: Vec<MaterialDocument> =
            cursor.try_collect().await.map_err(StoreError::backend)?;
        Ok(documents.into_iter().map(Material::from).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Material>, StoreError> {
        let oid = parse_id(id)?;
        let found = self
            .collection
            .find_one(doc! { "_id": oid }, None)
            .await
            .map_err(StoreError::backend)?;
        Ok(found.map(Material::from))
    }

    async fn replace(&self, material: &Material) -> Result<(), StoreError> {
        let document = MaterialDocument::from_material(material)?;
        let result = self
            .collection
            .replace_one(doc! { "_id": document.id }, &document, None)
            .await
            .map_err(StoreError::backend)?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound(material.id.clone()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let oid = parse_id(id)?;
        let result = self
            .collection
            .delete_one(doc! { "_id": oid }, None)
            .await
            .map_err(StoreError::backend)?;
        Ok(result.deleted_count > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(StoreError::connection)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> Material {
        Material {
            id: "65f0a1b2c3d4e5f601234567".into(),
            name: Some("PLA".into()),
            technology: Some("FDM".into()),
            colors: vec!["red".into(), "blue".into()],
            price_per_gram: Some(0.05),
            image_url: None,
        }
    }

    #[test]
    fn document_round_trips_to_material() {
        let original = material();
        let document = MaterialDocument::from_material(&original).unwrap();
        assert_eq!(document.id.to_hex(), original.id);

        let restored = Material::from(document);
        assert_eq!(restored, original);
    }

    #[test]
    fn document_uses_native_object_id_and_camel_case() {
        let document = MaterialDocument::from_material(&material()).unwrap();
        let stored = bson::to_document(&document).unwrap();

        assert_eq!(
            stored.get_object_id("_id").unwrap().to_hex(),
            "65f0a1b2c3d4e5f601234567"
        );
        assert_eq!(stored.get_f64("pricePerGram").unwrap(), 0.05);
        assert!(!stored.contains_key("imageUrl"));
    }

    #[test]
    fn malformed_id_is_rejected() {
        let mut bad = material();
        bad.id = "not-an-id".into();
        assert!(matches!(
            MaterialDocument::from_material(&bad),
            Err(StoreError::InvalidId(_))
        ));
    }

    #[test]
    fn reads_documents_written_by_other_clients() {
        let oid = ObjectId::new();
        let stored = doc! { "_id": oid, "name": "PETG", "__v": 0 };
        let document: MaterialDocument = bson::from_document(stored).unwrap();

        let material = Material::from(document);
        assert_eq!(material.id, oid.to_hex());
        assert_eq!(material.name.as_deref(), Some("PETG"));
        assert!(material.colors.is_empty());
        assert!(material.price_per_gram.is_none());
    }
}
