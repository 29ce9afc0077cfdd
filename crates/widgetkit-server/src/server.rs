//! Static asset server.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// URL prefix assets are served under; matches the default asset base URL.
pub const ASSETS_PREFIX: &str = "/assets";

/// Configuration for the asset server.
#[derive(Debug, Clone)]
pub struct AssetServerConfig {
    /// Directory to serve
    pub dir: PathBuf,

    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for AssetServerConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            host: "127.0.0.1".to_string(),
            port: 4444,
        }
    }
}

impl AssetServerConfig {
    /// Socket address to bind.
    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("Directory not found: {0}")]
    MissingDirectory(String),

    #[error("File watch error: {0}")]
    WatchError(String),
}

/// Router serving `dir` under `/assets` with permissive CORS, since the
/// hosting runtime loads widget assets from another origin.
pub fn asset_router(dir: &Path) -> Router {
    Router::new()
        .nest_service(ASSETS_PREFIX, ServeDir::new(dir))
        .layer(CorsLayer::permissive())
}

/// Serves a built output directory.
pub struct AssetServer {
    config: AssetServerConfig,
}

impl AssetServer {
    pub fn new(config: AssetServerConfig) -> Self {
        Self { config }
    }

    /// Serve until the process is stopped.
    pub async fn serve(self) -> Result<(), ServerError> {
        if !self.config.dir.exists() {
            return Err(ServerError::MissingDirectory(
                self.config.dir.display().to_string(),
            ));
        }

        let addr = self.config.addr()?;
        let app = asset_router(&self.config.dir);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        tracing::info!(
            "Serving {} at http://{}{}",
            self.config.dir.display(),
            addr,
            ASSETS_PREFIX
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}
