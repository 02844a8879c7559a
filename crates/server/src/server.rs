//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration for the material and health endpoints
//! - Static serving of uploaded images
//! - Middleware stack (logging, request ids, metrics, CORS, timeouts)
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{log_requests, panic_response, request_id, timeout_message, track_metrics};
use crate::routes::{health, materials, not_found};
use crate::state::ServerState;
use crate::uploads::PUBLIC_PREFIX;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::{from_fn, map_response};
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Routes:
/// - `/materials`, `/materials/{id}`: material CRUD, with or without a trailing slash
/// - `/uploads/*`: uploaded files, read-only
/// - `/health`, `/ready`, `/metrics`
///
/// Anything else, including unsupported methods on known paths, answers
/// 404 with `Cannot <METHOD> <path>`. Panics inside handlers become a 500
/// carrying the panic message.
pub fn build_router(state: Arc<ServerState>) -> Router {
    // CORS layer
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let collection = get(materials::list_materials)
        .post(materials::create_material)
        .fallback(not_found);
    let item = get(materials::get_material)
        .put(materials::update_material)
        .delete(materials::delete_material)
        .fallback(not_found);

    let material_routes = Router::new()
        .route("/materials", collection.clone())
        .route("/materials/", collection)
        .route("/materials/{id}", item.clone())
        .route("/materials/{id}/", item)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()));

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics));

    let mut app = Router::new()
        .merge(material_routes)
        .merge(health_routes)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(state.uploads.dir()))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response));

    // Requests only get cut off when a timeout is configured.
    if let Some(timeout) = state.config.timeout() {
        app = app
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            ))
            .layer(map_response(timeout_message));
    }

    // log_requests reads the id from extensions, so request_id must wrap it.
    app.layer(cors)
        .layer(from_fn(track_metrics))
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the material HTTP server
///
/// Initializes logging and metrics, connects the document store once, makes
/// sure the upload directory exists and serves until SIGTERM or Ctrl+C.
///
/// A store that cannot be reached does not stop the server; the failure is
/// logged and requests fail against it until it becomes reachable.
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    let mut state = ServerState::connect(config.clone()).await;
    if config.metrics_enabled {
        state = state.with_metrics(PrometheusBuilder::new().install_recorder()?);
    }
    state.uploads.ensure_dir().await?;

    let app = build_router(Arc::new(state));

    // Parse bind address
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        "Starting material server on {} (uploads in {})",
        addr,
        config.upload_dir.display()
    );
    match config.timeout_secs {
        Some(secs) => tracing::info!("Timeout: {}s, Max body: {}MB", secs, config.max_body_size_mb),
        None => tracing::info!("Timeout: none, Max body: {}MB", config.max_body_size_mb),
    }
    tracing::info!(
        "CORS: {}, Metrics: {}",
        config.enable_cors,
        config.metrics_enabled
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::io;
    use std::sync::Mutex;
    use store::InMemoryBackend;
    use tower::ServiceExt;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn router() -> Router {
        let state = ServerState::new(ServerConfig::default(), Arc::new(InMemoryBackend::new()));
        build_router(Arc::new(state))
    }

    #[tokio::test]
    async fn request_logs_carry_the_request_id() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::INFO)
            .with_writer(logs.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");

        let output = logs.contents();
        let tagged: Vec<&str> = output
            .lines()
            .filter(|line| line.contains("Request started") || line.contains("Request completed"))
            .collect();
        assert_eq!(tagged.len(), 2, "log output: {output}");
        assert!(tagged.iter().all(|line| line.contains(r#""request_id":"abc-123""#)));
    }

    #[tokio::test]
    async fn item_route_accepts_trailing_slash() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/materials/65f0a1b2c3d4e5f601234567/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["message"], "Material not found");
    }
}
