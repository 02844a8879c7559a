use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use store::BackendConfig;

/// Environment variable holding the document store connection string.
pub const MONGODB_URI_ENV: &str = "MONGODB_URI";

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Document store connection string (read from `MONGODB_URI`)
    #[serde(default)]
    pub mongodb_uri: Option<String>,

    /// Database name; falls back to the one named in the connection string
    #[serde(default)]
    pub database: Option<String>,

    /// Collection holding material records
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Directory uploaded images are written to and served from
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Request timeout in seconds; requests are never cut off when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            mongodb_uri: None,
            database: None,
            collection: default_collection(),
            upload_dir: default_upload_dir(),
            timeout_secs: None,
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server` config file and
    /// environment variables prefixed with `MATERIALS_SERVER__`.
    pub fn load() -> anyhow::Result<Self> {
        // A missing .env file is fine; real deployments set variables directly.
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("MATERIALS_SERVER").separator("__"))
            .set_override_option("mongodb_uri", std::env::var(MONGODB_URI_ENV).ok())?;

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Request timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }

    /// Backend configuration for the document store, if a connection string is set.
    pub fn backend(&self) -> Option<BackendConfig> {
        let uri = self.mongodb_uri.as_ref()?;
        Some(
            BackendConfig::mongo(uri.clone())
                .with_database(self.database.clone())
                .with_collection(Some(self.collection.clone())),
        )
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_collection() -> String {
    "materials".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_body_size_mb() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
