//! # Material Store
//!
//! Backend-agnostic persistence for material records. Handlers talk to the
//! [`MaterialStore`] trait; the concrete backend is chosen at startup through
//! [`BackendConfig`]:
//!
//! - an in-memory backend for tests and local demos,
//! - a MongoDB backend (feature `backend-mongo`, on by default).
//!
//! The [`model`] module also owns the field casting rules a write goes
//! through, so every backend rejects the same malformed values with the same
//! messages.
//!
//! ```
//! use store::{BackendConfig, Caster, MaterialDraft, MaterialStore, Projection};
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = BackendConfig::in_memory().connect().await.unwrap();
//!
//! let mut caster = Caster::new();
//! let draft = MaterialDraft {
//!     name: caster.text("name", Some(&json!("PLA"))),
//!     price_per_gram: caster.number("pricePerGram", Some(&json!("0.05"))),
//!     ..Default::default()
//! };
//! caster.finish().unwrap();
//!
//! let created = store.insert(draft).await.unwrap();
//! let listed = store.list(Projection::WithoutImage).await.unwrap();
//! assert_eq!(listed[0].id, created.id);
//! # });
//! ```

mod backend;
mod error;
pub mod model;

#[cfg(feature = "backend-mongo")]
pub use backend::mongo;
#[cfg(feature = "backend-mongo")]
pub use backend::MongoBackend;
pub use backend::{BackendConfig, InMemoryBackend, MaterialStore, UnavailableBackend};
pub use error::StoreError;
pub use model::{parse_id, Caster, Material, MaterialDraft, Projection};

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> MaterialDraft {
        MaterialDraft {
            name: Some(name.to_string()),
            technology: Some("FDM".into()),
            colors: vec!["red".into(), "blue".into()],
            price_per_gram: Some(0.05),
            image_url: Some("/uploads/1.png".into()),
        }
    }

    #[tokio::test]
    async fn in_memory_insert_then_get() {
        let store = InMemoryBackend::new();
        let created = store.insert(draft("PLA")).await.expect("insert succeeds");

        assert_eq!(created.id.len(), 24);
        let fetched = store.get(&created.id).await.expect("get ok").expect("exists");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn in_memory_list_keeps_insertion_order_and_projects() {
        let store = InMemoryBackend::new();
        let a = store.insert(draft("a")).await.unwrap();
        let b = store.insert(draft("b")).await.unwrap();

        let full = store.list(Projection::Full).await.unwrap();
        assert_eq!(full, vec![a.clone(), b.clone()]);

        let summaries = store.list(Projection::WithoutImage).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|m| m.image_url.is_none()));
        assert_eq!(summaries[0].name.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn in_memory_replace_and_delete() {
        let store = InMemoryBackend::new();
        let mut material = store.insert(draft("PLA")).await.unwrap();

        material.technology = Some("SLA".into());
        store.replace(&material).await.unwrap();
        let fetched = store.get(&material.id).await.unwrap().unwrap();
        assert_eq!(fetched.technology.as_deref(), Some("SLA"));

        assert!(store.delete(&material.id).await.unwrap());
        assert!(!store.delete(&material.id).await.unwrap());
        assert!(store.get(&material.id).await.unwrap().is_none());
        assert!(matches!(
            store.replace(&material).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected() {
        let store = InMemoryBackend::new();
        assert!(matches!(
            store.get("not-an-id").await,
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            store.delete("xyz").await,
            Err(StoreError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn unavailable_backend_fails_everything() {
        let store = UnavailableBackend::new("no connection string");
        let err = store.list(Projection::Full).await.unwrap_err();
        assert_eq!(err, StoreError::Connection("no connection string".into()));
        assert!(store.ping().await.is_err());
        assert!(store.insert(MaterialDraft::default()).await.is_err());
    }
}
