//! Development server command.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use widgetkit_build::WidgetBuilder;
use widgetkit_server::{DevServer, DevServerConfig};

use crate::config::{self, Overrides};

/// Run the dev server.
pub async fn run(
    root: &Path,
    config_path: &Path,
    overrides: Overrides,
    host: String,
    port: u16,
) -> Result<()> {
    tracing::info!("Starting development server on port {}", port);

    let file_config = config::load_config(config_path)?;
    let bundler = config::bundler(root, &file_config.bundler);
    let build_config = config::build_config(root, file_config, overrides)?;

    let builder = WidgetBuilder::new(build_config, Arc::new(bundler));

    let config = DevServerConfig { host, port };
    tracing::info!(
        "Watching sources; restart to apply changes to {}",
        config_path.display()
    );

    DevServer::new(config, builder).start().await?;

    Ok(())
}
