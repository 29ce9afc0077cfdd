//! Widget build command.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use widgetkit_build::WidgetBuilder;

use crate::config::{self, Overrides};

/// Run the build command.
pub async fn run(root: &Path, config_path: &Path, overrides: Overrides) -> Result<()> {
    tracing::info!("Building widgets...");

    let file_config = config::load_config(config_path)?;
    let bundler = config::bundler(root, &file_config.bundler);
    let build_config = config::build_config(root, file_config, overrides)?;

    let result = WidgetBuilder::new(build_config, Arc::new(bundler))
        .build()
        .await?;

    for widget in &result.widgets {
        tracing::info!(
            "{}: {} ({})",
            widget.name,
            widget.html_live.display(),
            widget.html_pinned.display()
        );
    }

    tracing::info!(
        "Built {} widgets with hash {} in {}ms",
        result.widgets.len(),
        result.hash,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
