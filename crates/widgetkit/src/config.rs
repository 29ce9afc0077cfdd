//! Layered configuration: defaults, then widgetkit.toml, then environment
//! and command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use widgetkit_build::{read_package_version, AssetConfig, BuildConfig, EsbuildBundler};

/// Configuration file structure (widgetkit.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub assets: AssetSettings,
    #[serde(default)]
    pub bundler: BundlerSettings,
}

#[derive(Debug, Deserialize, Default)]
pub struct BuildSettings {
    source_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    /// Stylesheets imported by every widget
    global_styles: Option<Vec<PathBuf>>,
    entry_extensions: Option<Vec<String>>,
    style_extensions: Option<Vec<String>>,
    #[serde(default)]
    targets: Vec<String>,
    minify: Option<bool>,
    /// Overrides the version read from package.json
    version: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AssetSettings {
    base_url: Option<String>,
    telemetry_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BundlerSettings {
    command: Option<String>,
    target: Option<String>,
}

/// Values taken from the command line or environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub targets: Vec<String>,
    pub out_dir: Option<PathBuf>,
    pub minify: Option<bool>,
    pub base_url: Option<String>,
    pub telemetry_url: Option<String>,
}

/// Load configuration from widgetkit.toml if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    Ok(ConfigFile::default())
}

/// Resolve the final build configuration.
pub fn build_config(root: &Path, file: ConfigFile, overrides: Overrides) -> Result<BuildConfig> {
    let root = std::path::absolute(root)
        .with_context(|| format!("Failed to resolve project root {}", root.display()))?;
    let defaults = BuildConfig::default();
    let build = file.build;

    let version = match build.version {
        Some(version) => version,
        None => read_package_version(&root).context(
            "No package version: set [build] version in widgetkit.toml or add package.json",
        )?,
    };

    let targets = if overrides.targets.is_empty() {
        build.targets
    } else {
        overrides.targets
    };

    let base_url = overrides.base_url.or(file.assets.base_url);
    let telemetry_url = overrides.telemetry_url.or(file.assets.telemetry_url);

    Ok(BuildConfig {
        source_dir: build.source_dir.unwrap_or(defaults.source_dir),
        out_dir: overrides
            .out_dir
            .or(build.out_dir)
            .unwrap_or(defaults.out_dir),
        global_styles: build.global_styles.unwrap_or(defaults.global_styles),
        entry_extensions: build.entry_extensions.unwrap_or(defaults.entry_extensions),
        style_extensions: build.style_extensions.unwrap_or(defaults.style_extensions),
        targets,
        version,
        minify: overrides.minify.or(build.minify).unwrap_or(defaults.minify),
        assets: AssetConfig::new(base_url.as_deref(), telemetry_url.as_deref()),
        root,
    })
}

/// Configure the esbuild driver, preferring a project-local install.
///
/// The command path is made absolute because esbuild runs with the widget's
/// directory as its working directory.
pub fn bundler(root: &Path, settings: &BundlerSettings) -> EsbuildBundler {
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());

    let command = match &settings.command {
        // Bare names are looked up on PATH; anything with a separator is a
        // path relative to the project root.
        Some(command) if command.contains('/') || command.contains('\\') => {
            root.join(command).display().to_string()
        }
        Some(command) => command.clone(),
        None => {
            let local = root.join("node_modules").join(".bin").join("esbuild");
            if local.exists() {
                local.display().to_string()
            } else {
                "esbuild".to_string()
            }
        }
    };

    let bundler = EsbuildBundler::new(command);
    match &settings.target {
        Some(target) => bundler.with_target(target.clone()),
        None => bundler,
    }
}
