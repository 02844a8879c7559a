//! Material Server - HTTP REST API for material records
//!
//! Reads configuration from the environment (including `MONGODB_URI`) and
//! serves until interrupted.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
