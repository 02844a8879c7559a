//! Workspace umbrella crate for the material catalogue service.
//!
//! Re-exports the document store abstraction and the HTTP server so callers
//! can embed the service, or drive its router directly in tests, through a
//! single dependency.

pub use server::{
    ServerConfig, ServerError, ServerResult, ServerState, build_router, start_server,
};
pub use store::{
    BackendConfig, Caster, InMemoryBackend, Material, MaterialDraft, MaterialStore, Projection,
    StoreError, UnavailableBackend,
};

#[cfg(feature = "mongo")]
pub use store::MongoBackend;

/// HTTP layer: routes, extractors, uploads and middleware.
pub mod http {
    pub use server::routes::materials::{is_truthy, normalize_colors};
    pub use server::routes::payload::{ImageSource, MaterialPayload, UploadedFile};
    pub use server::uploads::{PUBLIC_PREFIX, UploadStore, extension_of};
}
