//! Build, serve, and rebuild on change.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::Receiver;
use widgetkit_build::{BuildConfig, WidgetBuilder};

use crate::server::{AssetServer, AssetServerConfig, ServerError};
use crate::watcher::{FileWatcher, WatchEvent};

/// Quiet period after a change before rebuilding, so an editor's burst of
/// writes triggers one build.
const SETTLE: Duration = Duration::from_millis(150);

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4444,
        }
    }
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
    builder: Arc<WidgetBuilder>,
}

impl DevServer {
    /// Create a new development server around a configured builder.
    pub fn new(config: DevServerConfig, builder: WidgetBuilder) -> Self {
        Self {
            config,
            builder: Arc::new(builder),
        }
    }

    /// Build once, then serve the output and rebuild on every change.
    pub async fn start(self) -> Result<(), ServerError> {
        let build_config = self.builder.config();
        let out_dir = build_config.out_path();

        rebuild(&self.builder).await;

        let (watcher, rx) = FileWatcher::new(&watch_paths(build_config), vec![out_dir.clone()])
            .map_err(|e| ServerError::WatchError(e.to_string()))?;

        let builder = Arc::clone(&self.builder);
        tokio::spawn(async move {
            watch_loop(builder, rx).await;
            // Keep watcher alive
            drop(watcher);
        });

        AssetServer::new(AssetServerConfig {
            dir: out_dir,
            host: self.config.host.clone(),
            port: self.config.port,
        })
        .serve()
        .await
    }
}

/// Inputs whose changes trigger a rebuild.
///
/// The builder keeps the configuration it started with, so the config file
/// itself is not watched; changing it needs a restart.
fn watch_paths(config: &BuildConfig) -> Vec<PathBuf> {
    let mut paths = vec![config.source_path()];
    paths.extend(config.global_style_paths());
    paths
}

/// Rebuild once per settled burst of changes.
async fn watch_loop(builder: Arc<WidgetBuilder>, mut rx: Receiver<WatchEvent>) {
    while let Some(event) = rx.recv().await {
        tracing::info!("Changed: {}", event.path().display());

        // Drain the rest of the burst.
        while let Ok(Some(event)) = tokio::time::timeout(SETTLE, rx.recv()).await {
            tracing::debug!("Changed: {}", event.path().display());
        }

        rebuild(&builder).await;
    }
}

/// Run the pipeline, logging instead of propagating failures so the watcher
/// keeps running.
async fn rebuild(builder: &WidgetBuilder) {
    match builder.build().await {
        Ok(result) => tracing::info!(
            "Built {} widgets (hash {}) in {}ms",
            result.widgets.len(),
            result.hash,
            result.duration_ms
        ),
        Err(e) => tracing::error!("Build failed: {}", e),
    }
}
