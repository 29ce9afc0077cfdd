//! Export-contract check for widget entry modules.
//!
//! A widget module must export either a `default` value or a named `App`
//! component. This is a text heuristic, not a parse; it only exists to warn
//! early when a widget would end up with an `undefined` default export.

use std::fs;
use std::sync::LazyLock;

use regex::Regex;

use crate::discovery::{DiscoveryError, Entry};

static DEFAULT_EXPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Match: export default ... or export { X as default }
    Regex::new(r"\bexport\s+default\b|\bexport\s*\{[^}]*\bas\s+default\b")
        .expect("Invalid default export regex")
});

static APP_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Match: export function App / export const App / export class App
    Regex::new(r"\bexport\s+(?:async\s+)?(?:function\*?|const|let|var|class)\s+App\b")
        .expect("Invalid App declaration regex")
});

static EXPORT_LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bexport\s*\{([^}]*)\}").expect("Invalid export list regex"));

/// Which of the contract's exports an entry module appears to provide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportContract {
    /// Module has a `default` export
    pub has_default: bool,

    /// Module has a named `App` export
    pub has_app: bool,
}

impl ExportContract {
    /// Inspect module source text.
    pub fn inspect(source: &str) -> Self {
        let has_default = DEFAULT_EXPORT_RE.is_match(source);

        let has_app = APP_DECL_RE.is_match(source)
            || EXPORT_LIST_RE
                .captures_iter(source)
                .any(|cap| exports_app(cap.get(1).map_or("", |m| m.as_str())));

        Self {
            has_default,
            has_app,
        }
    }

    /// True when the synthesized default export will resolve to something.
    pub fn is_satisfied(&self) -> bool {
        self.has_default || self.has_app
    }
}

/// Read an entry module and inspect its exports.
pub fn check_entry(entry: &Entry) -> Result<ExportContract, DiscoveryError> {
    let source = fs::read_to_string(&entry.path).map_err(|e| DiscoveryError::Read {
        path: entry.path.display().to_string(),
        source: e,
    })?;

    Ok(ExportContract::inspect(&source))
}

/// Whether an `export { ... }` list exposes the name `App`.
fn exports_app(list: &str) -> bool {
    list.split(',').any(|item| {
        let exported = match item.split_once(" as ") {
            Some((_, alias)) => alias,
            None => item,
        };
        exported.trim() == "App"
    })
}
