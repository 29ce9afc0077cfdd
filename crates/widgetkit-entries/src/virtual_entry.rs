//! Synthetic entry modules.
//!
//! The bundler is never pointed at a widget's `index.tsx` directly. Instead it
//! builds a generated module that pulls in the widget's stylesheets first and
//! then re-exports the real module, so the stylesheet order is fixed and the
//! widget always has a `default` export.

use std::path::{Path, PathBuf};

use crate::discovery::Entry;
use crate::styles::StylesheetSet;

/// Namespace for virtual module identifiers.
pub const VIRTUAL_PREFIX: &str = "virtual-entry:";

/// Local binding for the real module's namespace inside the generated code.
const ENTRY_NAMESPACE: &str = "__widget_entry";

/// An in-memory entry module bound to one real widget module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualModule {
    /// Identifier the bundler sees for this module
    id: String,

    /// Real widget module being wrapped
    entry: PathBuf,

    /// Stylesheets imported for side effect, in cascade order
    stylesheets: Vec<PathBuf>,
}

impl VirtualModule {
    /// Build the virtual module for an entry and its resolved stylesheets.
    pub fn new(entry: &Entry, styles: &StylesheetSet) -> Self {
        Self {
            id: format!("{}{}", VIRTUAL_PREFIX, entry.path.display()),
            entry: entry.path.clone(),
            stylesheets: styles.paths(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The real module this virtual module wraps.
    pub fn entry(&self) -> &Path {
        &self.entry
    }

    /// Directory relative imports in the generated code resolve from.
    pub fn resolve_dir(&self) -> &Path {
        self.entry.parent().unwrap_or(Path::new(""))
    }

    /// Modules imported purely for their side effects, in order: every
    /// stylesheet, then the real module itself.
    pub fn effect_imports(&self) -> Vec<&Path> {
        self.stylesheets
            .iter()
            .map(PathBuf::as_path)
            .chain(std::iter::once(self.entry.as_path()))
            .collect()
    }

    /// Generated module text.
    pub fn source(&self) -> String {
        synthesize_entry(&self.entry, &self.stylesheets)
    }
}

/// Generate the text of a virtual entry module.
///
/// The output has three sections:
/// 1. one bare `import` per stylesheet, in the given order
/// 2. `export *` from the entry plus a `default` export taken from the
///    entry's `default`, falling back to its `App` export
/// 3. a bare `import` of the entry so its top-level code always runs
pub fn synthesize_entry(entry: &Path, stylesheets: &[PathBuf]) -> String {
    let entry_spec = module_specifier(entry);

    let mut out = String::new();

    for css in stylesheets {
        out.push_str(&format!("import {};\n", module_specifier(css)));
    }
    if !stylesheets.is_empty() {
        out.push('\n');
    }

    out.push_str(&format!("export * from {entry_spec};\n"));
    out.push_str(&format!("import * as {ENTRY_NAMESPACE} from {entry_spec};\n"));
    out.push_str(&format!(
        "export default ({ENTRY_NAMESPACE}.default ?? {ENTRY_NAMESPACE}.App);\n"
    ));
    out.push('\n');
    out.push_str(&format!("import {entry_spec};\n"));

    out
}

/// Quote a path as a JavaScript string literal.
fn module_specifier(path: &Path) -> String {
    let raw = path.to_string_lossy();
    serde_json::to_string(raw.as_ref()).unwrap_or_else(|_| format!("\"{}\"", raw))
}
