//! Stylesheet resolution for widget entries.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::discovery::{DiscoveryError, Entry};

// Scoped stylesheets (`card.module.css`) are imported by the component code
// itself and must not be pulled in globally.
static SCOPED_MODULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.module\.[^/\\]*$").expect("Invalid scoped module regex"));

/// Ordered stylesheets bundled with one widget.
///
/// Global stylesheets always come before entry-local ones so that local rules
/// win on equal specificity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylesheetSet {
    global: Vec<PathBuf>,
    local: Vec<PathBuf>,
}

impl StylesheetSet {
    /// Global stylesheets, in configured order.
    pub fn global(&self) -> &[PathBuf] {
        &self.global
    }

    /// Entry-local stylesheets, sorted by path.
    pub fn local(&self) -> &[PathBuf] {
        &self.local
    }

    /// All stylesheets in import order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.global.iter().chain(&self.local).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.global.len() + self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Computes the [`StylesheetSet`] for each entry.
#[derive(Debug, Clone)]
pub struct StyleResolver {
    /// Absolute paths of stylesheets shared by every widget
    globals: Vec<PathBuf>,

    /// Extensions treated as stylesheets next to an entry
    extensions: Vec<String>,
}

impl StyleResolver {
    /// Create a resolver from the global stylesheet list and the set of
    /// stylesheet extensions to pick up beside each entry.
    pub fn new(globals: Vec<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            globals,
            extensions,
        }
    }

    /// Global stylesheets that are configured but not present on disk.
    pub fn missing_globals(&self) -> Vec<&Path> {
        self.globals
            .iter()
            .filter(|p| !p.is_file())
            .map(PathBuf::as_path)
            .collect()
    }

    /// Resolve the stylesheets for one entry.
    ///
    /// Local stylesheets are collected recursively from the entry's
    /// directory, skipping hidden paths and scoped `*.module.*` files, then
    /// sorted lexicographically.
    pub fn resolve(&self, entry: &Entry) -> Result<StylesheetSet, DiscoveryError> {
        let global: Vec<PathBuf> = self
            .globals
            .iter()
            .filter(|p| p.is_file())
            .cloned()
            .collect();

        let mut local = Vec::new();

        for item in WalkDir::new(entry.dir())
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
        {
            let item = item?;
            let path = item.path();

            if !item.file_type().is_file() || !self.is_stylesheet(path) {
                continue;
            }

            if SCOPED_MODULE_RE.is_match(&path.to_string_lossy()) {
                continue;
            }

            local.push(path.to_path_buf());
        }

        local.sort();

        Ok(StylesheetSet { global, local })
    }

    fn is_stylesheet(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.extensions.iter().any(|allowed| allowed == ext)
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}
