use crate::config::{ServerConfig, MONGODB_URI_ENV};
use crate::uploads::UploadStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use store::{MaterialStore, UnavailableBackend};

/// Shared application state
///
/// Built once at startup and handed to every handler; nothing in here is
/// mutated after construction.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Document store handle (shared across requests)
    pub store: Arc<dyn MaterialStore>,

    /// Upload directory
    pub uploads: UploadStore,

    /// Prometheus render handle, present when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Create state around an already built store.
    pub fn new(config: ServerConfig, store: Arc<dyn MaterialStore>) -> Self {
        let uploads = UploadStore::new(config.upload_dir.clone());
        Self {
            config: Arc::new(config),
            store,
            uploads,
            metrics: None,
        }
    }

    /// Build the configured document store and wrap it in server state.
    ///
    /// A store that cannot be built is logged and replaced by one that fails
    /// every request; the process keeps running either way. The reachability
    /// check runs in the background so startup never waits on the database.
    pub async fn connect(config: ServerConfig) -> Self {
        let store: Arc<dyn MaterialStore> = match config.backend() {
            None => {
                let reason = format!("{MONGODB_URI_ENV} is not set");
                tracing::error!(error = %reason, "Could not connect to MongoDB");
                Arc::new(UnavailableBackend::new(reason))
            }
            Some(backend) => match backend.connect().await {
                Ok(store) => {
                    let store: Arc<dyn MaterialStore> = Arc::from(store);
                    let probe = store.clone();
                    tokio::spawn(async move {
                        match probe.ping().await {
                            Ok(()) => tracing::info!(backend = probe.name(), "Connected to MongoDB"),
                            Err(err) => {
                                tracing::error!(error = %err, "Could not connect to MongoDB")
                            }
                        }
                    });
                    store
                }
                Err(err) => {
                    tracing::error!(error = %err, "Could not connect to MongoDB");
                    Arc::new(UnavailableBackend::new(err))
                }
            },
        };

        Self::new(config, store)
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{InMemoryBackend, Projection};

    #[tokio::test]
    async fn connect_without_uri_yields_unavailable_store() {
        let state = ServerState::connect(ServerConfig::default()).await;
        assert_eq!(state.store.name(), "unavailable");

        let err = state.store.list(Projection::Full).await.unwrap_err();
        assert_eq!(err.to_string(), "MONGODB_URI is not set");
    }

    #[tokio::test]
    async fn new_uses_configured_upload_dir() {
        let config = ServerConfig {
            upload_dir: "/tmp/material-uploads".into(),
            ..ServerConfig::default()
        };
        let state = ServerState::new(config, Arc::new(InMemoryBackend::new()));
        assert_eq!(
            state.uploads.dir(),
            std::path::Path::new("/tmp/material-uploads")
        );
        assert!(state.metrics.is_none());
    }
}
