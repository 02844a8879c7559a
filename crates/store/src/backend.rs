use crate::model::{parse_id, Material, MaterialDraft, Projection};
use crate::StoreError;
use async_trait::async_trait;
use bson::oid::ObjectId;
use std::sync::RwLock;

/// Persistence for the material collection.
///
/// Every method addresses records by their hex ObjectId. Implementations must
/// be safe to share across request handlers.
#[async_trait]
pub trait MaterialStore: Send + Sync {
    /// Short name of the backend, used in logs and readiness output.
    fn name(&self) -> &'static str;

    /// Persist a new record and return it with its assigned identifier.
    async fn insert(&self, draft: MaterialDraft) -> Result<Material, StoreError>;

    /// Return every record in store order.
    async fn list(&self, projection: Projection) -> Result<Vec<Material>, StoreError>;

    /// Fetch one record. Malformed identifiers are an error, unknown ones are `None`.
    async fn get(&self, id: &str) -> Result<Option<Material>, StoreError>;

    /// Overwrite an existing record in place.
    async fn replace(&self, material: &Material) -> Result<(), StoreError>;

    /// Remove a record. Returns `true` if it existed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Configuration for selecting and building a backend.
///
/// ```
/// use store::BackendConfig;
///
/// let config = BackendConfig::in_memory();
/// let config = BackendConfig::mongo("mongodb://localhost:27017/materials");
/// ```
#[derive(Clone, Debug, Default)]
pub enum BackendConfig {
    /// MongoDB reachable at `uri`. `database` overrides the database named in
    /// the URI; `collection` defaults to `materials`.
    Mongo {
        uri: String,
        database: Option<String>,
        collection: Option<String>,
    },
    /// Process-local map, useful for tests and demos.
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn mongo<S: Into<String>>(uri: S) -> Self {
        BackendConfig::Mongo {
            uri: uri.into(),
            database: None,
            collection: None,
        }
    }

    pub fn with_database(mut self, name: Option<String>) -> Self {
        if let BackendConfig::Mongo { database, .. } = &mut self {
            *database = name;
        }
        self
    }

    pub fn with_collection(mut self, name: Option<String>) -> Self {
        if let BackendConfig::Mongo { collection, .. } = &mut self {
            *collection = name;
        }
        self
    }

    /// Build the configured backend. Reachability is checked separately with
    /// [`MaterialStore::ping`]; a backend that fails the ping stays usable and
    /// recovers once the server comes up.
    pub async fn connect(&self) -> Result<Box<dyn MaterialStore>, StoreError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::Mongo {
                uri,
                database,
                collection,
            } => {
                #[cfg(feature = "backend-mongo")]
                {
                    let backend =
                        MongoBackend::connect(uri, database.as_deref(), collection.as_deref())
                            .await?;
                    Ok(Box::new(backend))
                }
                #[cfg(not(feature = "backend-mongo"))]
                {
                    let _ = (uri, database, collection);
                    Err(StoreError::backend("mongo backend disabled at compile time"))
                }
            }
        }
    }
}

/// An in-memory backend keeping records in insertion order.
pub struct InMemoryBackend {
    records: RwLock<Vec<Material>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MaterialStore for InMemoryBackend {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    async fn insert(&self, draft: MaterialDraft) -> Result<Material, StoreError> {
        let material = draft.into_material(ObjectId::new());
        self.records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?
            .push(material.clone());
        Ok(material)
    }

    async fn list(&self, projection: Projection) -> Result<Vec<Material>, StoreError> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(match projection {
            Projection::Full => guard.clone(),
            Projection::WithoutImage => guard.iter().map(Material::without_image).collect(),
        })
    }

    async fn get(&self, id: &str) -> Result<Option<Material>, StoreError> {
        let id = parse_id(id)?.to_hex();
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(guard.iter().find(|m| m.id == id).cloned())
    }

    async fn replace(&self, material: &Material) -> Result<(), StoreError> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        match guard.iter_mut().find(|m| m.id == material.id) {
            Some(slot) => {
                *slot = material.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(material.id.clone())),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let id = parse_id(id)?.to_hex();
        let mut guard = self
            .records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        let before = guard.len();
        guard.retain(|m| m.id != id);
        Ok(guard.len() != before)
    }
}

/// Stand-in used when the configured store could not be built at startup,
/// e.g. a missing or unparseable connection string. Every operation fails
/// with the original error.
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new<E: std::fmt::Display>(reason: E) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }

    fn fail<T>(&self) -> Result<T, StoreError> {
        Err(StoreError::Connection(self.reason.clone()))
    }
}

#[async_trait]
impl MaterialStore for UnavailableBackend {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn insert(&self, _draft: MaterialDraft) -> Result<Material, StoreError> {
        self.fail()
    }

    async fn list(&self, _projection: Projection) -> Result<Vec<Material>, StoreError> {
        self.fail()
    }

    async fn get(&self, _id: &str) -> Result<Option<Material>, StoreError> {
        self.fail()
    }

    async fn replace(&self, _material: &Material) -> Result<(), StoreError> {
        self.fail()
    }

    async fn delete(&self, _id: &str) -> Result<bool, StoreError> {
        self.fail()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.fail()
    }
}

/// MongoDB backend.
#[cfg(feature = "backend-mongo")]
pub mod mongo;

#[cfg(feature = "backend-mongo")]
pub use mongo::MongoBackend;
