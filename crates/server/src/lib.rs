//! Material Server - HTTP REST API for material records
//!
//! This crate exposes a single collection of materials (name, technology,
//! colors, price per gram, image reference) over HTTP:
//!
//! - **Materials**: list, fetch, create, update and delete records
//! - **Uploads**: `image` files attached to a create or update are written to
//!   disk and served back read-only under `/uploads`
//! - **Health & Metrics**: liveness/readiness probes and Prometheus metrics
//!
//! Write routes accept either `multipart/form-data` or a JSON object. Every
//! error response has the shape `{"message": "..."}`.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /materials` - List materials (without `imageUrl`)
//! - `GET /materials/{id}` - Get one material
//! - `POST /materials` - Create a material
//! - `PUT /materials/{id}` - Update a material
//! - `DELETE /materials/{id}` - Delete a material
//! - `GET /uploads/{file}` - Uploaded image bytes
//! - `GET /health`, `GET /ready`, `GET /metrics`

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod uploads;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
