//! Asset server command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use widgetkit_build::BuildConfig;
use widgetkit_server::{AssetServer, AssetServerConfig, ServerError};

use crate::config;

/// Run the serve command.
pub async fn run(
    root: &Path,
    config_path: &Path,
    dir: Option<PathBuf>,
    host: String,
    port: u16,
) -> Result<()> {
    let file_config = config::load_config(config_path)?;

    let dir = dir
        .or(file_config.build.out_dir)
        .unwrap_or_else(|| BuildConfig::default().out_dir);
    let dir = if dir.is_absolute() { dir } else { root.join(dir) };

    let server = AssetServer::new(AssetServerConfig { dir, host, port });

    match server.serve().await {
        Err(ServerError::MissingDirectory(dir)) => {
            anyhow::bail!("Directory not found: {}. Run 'widgetkit build' first.", dir)
        }
        other => other.map_err(Into::into),
    }
}
