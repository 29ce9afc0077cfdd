//! Widget entry discovery.
//!
//! Walks a source tree for `index.{ext}` modules. Each match is one widget,
//! named after the directory that contains it.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// File stem every widget entry module must have.
const ENTRY_STEM: &str = "index";

/// A discovered widget entry module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Widget name (base name of the entry's parent directory)
    pub name: String,

    /// Absolute path to the entry module
    pub path: PathBuf,
}

impl Entry {
    /// Directory containing the entry module.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }
}

/// Errors that can occur while scanning the source tree.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Failed to resolve {path}: {source}")]
    Resolve {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
}

/// Find every widget entry under `source_dir`.
///
/// An entry is a file named `index.<ext>` where `<ext>` is one of
/// `extensions`. Hidden directories and `node_modules` are skipped. A missing
/// source directory yields no entries rather than an error.
///
/// Results are sorted by path so the same tree always produces the same
/// order on every platform.
pub fn discover_entries(
    source_dir: &Path,
    extensions: &[String],
) -> Result<Vec<Entry>, DiscoveryError> {
    if !source_dir.is_dir() {
        return Ok(Vec::new());
    }

    let root = std::path::absolute(source_dir).map_err(|e| DiscoveryError::Resolve {
        path: source_dir.display().to_string(),
        source: e,
    })?;

    let mut entries = Vec::new();

    for item in WalkDir::new(&root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
    {
        let item = item?;
        let path = item.path();

        if !item.file_type().is_file() || !is_entry_file(path, extensions) {
            continue;
        }

        let Some(name) = widget_name(path) else {
            continue;
        };

        entries.push(Entry {
            name,
            path: path.to_path_buf(),
        });
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(entries)
}

/// Derive the widget name from an entry path.
fn widget_name(path: &Path) -> Option<String> {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
}

fn is_entry_file(path: &Path, extensions: &[String]) -> bool {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    stem == ENTRY_STEM && extensions.iter().any(|allowed| allowed == ext)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_str().unwrap_or("");
    name.starts_with('.') || name == "node_modules"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn exts() -> Vec<String> {
        vec!["tsx".to_string(), "jsx".to_string()]
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "export default 1;").unwrap();
    }

    #[test]
    fn finds_entries_and_names_them_after_their_directory() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        touch(&src.join("components/b/index.tsx"));
        touch(&src.join("components/a/index.jsx"));

        let entries = discover_entries(&src, &exts()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();

        assert_eq!(names, vec!["a", "b"]);
        assert!(entries.iter().all(|e| e.path.is_absolute()));
        assert!(entries[0].dir().ends_with("components/a"));
    }

    #[test]
    fn ignores_other_files_and_extensions() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        touch(&src.join("widget/index.ts"));
        touch(&src.join("widget/main.tsx"));
        touch(&src.join("widget/index.css"));

        let entries = discover_entries(&src, &exts()).unwrap();

        assert!(entries.is_empty());
    }

    #[test]
    fn skips_hidden_and_node_modules_directories() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        touch(&src.join(".cache/index.tsx"));
        touch(&src.join("node_modules/pkg/index.tsx"));
        touch(&src.join("real/index.tsx"));

        let entries = discover_entries(&src, &exts()).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "real");
    }

    #[test]
    fn missing_source_dir_is_not_an_error() {
        let temp = tempdir().unwrap();

        let entries = discover_entries(&temp.path().join("nope"), &exts()).unwrap();

        assert!(entries.is_empty());
    }

    #[test]
    fn colliding_names_are_reported_as_found() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        touch(&src.join("one/card/index.tsx"));
        touch(&src.join("two/card/index.tsx"));

        let entries = discover_entries(&src, &exts()).unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.name == "card"));
    }
}
