//! Build configuration values.
//!
//! Everything here is resolved once before a build starts and passed down as
//! plain data; nothing in the pipeline reads the environment itself.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::builder::BuildError;

/// Asset base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4444/assets";

/// Path segment every asset base URL must end with.
const ASSETS_SUFFIX: &str = "/assets";

/// Where built assets are served from, and what to embed in each page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    /// Normalized asset base URL (no trailing slash, ends in `/assets`)
    pub base_url: String,

    /// Telemetry endpoint advertised to the widget, if any
    pub telemetry_url: Option<String>,
}

impl AssetConfig {
    /// Create an asset config from raw, possibly empty, values.
    pub fn new(base_url: Option<&str>, telemetry_url: Option<&str>) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            telemetry_url: telemetry_url
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Normalize a raw asset base URL.
///
/// Trailing slashes are stripped and `/assets` is appended when missing.
/// Malformed input is never rejected; a missing suffix only logs a warning.
pub fn normalize_base_url(raw: Option<&str>) -> String {
    let trimmed = raw.map(str::trim).unwrap_or("");
    let stripped = trimmed.trim_end_matches('/');

    if stripped.is_empty() {
        return DEFAULT_BASE_URL.to_string();
    }

    if stripped.ends_with(ASSETS_SUFFIX) {
        return stripped.to_string();
    }

    let normalized = format!("{}{}", stripped, ASSETS_SUFFIX);
    tracing::warn!(
        "Base URL {} does not end with {}; using {}",
        trimmed,
        ASSETS_SUFFIX,
        normalized
    );
    normalized
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root; relative paths below are resolved against it
    pub root: PathBuf,

    /// Directory scanned for widget entries
    pub source_dir: PathBuf,

    /// Flat output directory, wiped at the start of every run
    pub out_dir: PathBuf,

    /// Stylesheets imported by every widget, before its own
    pub global_styles: Vec<PathBuf>,

    /// Extensions accepted for `index.<ext>` entry modules
    pub entry_extensions: Vec<String>,

    /// Extensions picked up as entry-local stylesheets
    pub style_extensions: Vec<String>,

    /// Widget names to build; empty builds every discovered widget
    pub targets: Vec<String>,

    /// Package version mixed into the content hash
    pub version: String,

    /// Minify bundles
    pub minify: bool,

    /// Asset URLs embedded in the generated HTML
    pub assets: AssetConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            source_dir: PathBuf::from("src"),
            out_dir: PathBuf::from("assets"),
            global_styles: vec![PathBuf::from("src/index.css")],
            entry_extensions: vec!["tsx".to_string(), "jsx".to_string()],
            style_extensions: ["css", "pcss"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            targets: vec![],
            version: "0.0.0".to_string(),
            minify: true,
            assets: AssetConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Resolve a configured path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn source_path(&self) -> PathBuf {
        self.resolve(&self.source_dir)
    }

    pub fn out_path(&self) -> PathBuf {
        self.resolve(&self.out_dir)
    }

    /// Absolute paths of the global stylesheets.
    pub fn global_style_paths(&self) -> Vec<PathBuf> {
        self.global_styles.iter().map(|p| self.resolve(p)).collect()
    }

    /// Reject an output directory whose wipe would take the project with it.
    ///
    /// The output directory may not be the project root or the source
    /// directory, nor contain either of them.
    pub fn check_out_dir(&self) -> Result<(), BuildError> {
        let out = comparable(&self.out_path());
        let source = self.source_path();

        for (label, protected) in [("project root", &self.root), ("source directory", &source)] {
            if comparable(protected).starts_with(&out) {
                return Err(BuildError::Config(format!(
                    "output directory {} would delete the {} {}",
                    self.out_path().display(),
                    label,
                    protected.display()
                )));
            }
        }

        Ok(())
    }
}

/// Absolute form of `path` with `.` and `..` folded away, following symlinks
/// when the path exists.
fn comparable(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }

    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    fs::canonicalize(&normalized).unwrap_or(normalized)
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    version: String,
}

/// Read the `version` field from `package.json` in `root`.
pub fn read_package_version(root: &Path) -> Result<String, BuildError> {
    let path = root.join("package.json");

    let content = fs::read_to_string(&path)
        .map_err(|e| BuildError::ReadError(format!("{}: {}", path.display(), e)))?;

    let manifest: PackageManifest = serde_json::from_str(&content)
        .map_err(|e| BuildError::Config(format!("{}: {}", path.display(), e)))?;

    Ok(manifest.version)
}
