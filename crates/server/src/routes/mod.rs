//! API route handlers
//!
//! - `materials`: CRUD over material records
//! - `payload`: multipart / JSON body decoding shared by the write routes
//! - `health`: liveness, readiness and metrics

pub mod health;
pub mod materials;
pub mod payload;

use crate::error::ServerError;
use axum::http::{Method, Uri};

/// 404 handler for undefined routes and unsupported methods.
pub async fn not_found(method: Method, uri: Uri) -> ServerError {
    ServerError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
