//! Widget build pipeline.
//!
//! Discovery, then one bundler run per widget, then a single content hash
//! over everything written, then the HTML documents. Widgets are built one
//! at a time: they share an output directory and the hash must see every
//! output, so the hash step only starts after the last build has returned.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use widgetkit_entries::{
    check_entry, discover_entries, DiscoveryError, Entry, StyleResolver, VirtualModule,
};

use crate::bundler::{BundleRequest, Bundler, BundlerError};
use crate::config::BuildConfig;
use crate::hasher::{hashed_file_name, ContentHasher, HashError};
use crate::templates::{TemplateEngine, WidgetPage};

/// One widget that made it through the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltWidget {
    /// Widget name
    pub name: String,

    /// Hashed script
    pub script: PathBuf,

    /// Hashed stylesheet, when the widget had any CSS
    pub stylesheet: Option<PathBuf>,

    /// `{name}-{hash}.html`
    pub html_pinned: PathBuf,

    /// `{name}.html`, always pointing at the latest build
    pub html_live: PathBuf,
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Content hash applied to every output
    pub hash: String,

    /// Widgets built, in build order
    pub widgets: Vec<BuiltWidget>,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to discover widgets: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Widget name '{name}' is derived from both {first} and {second}")]
    DuplicateWidget {
        name: String,
        first: String,
        second: String,
    },

    #[error("Build failed for widget '{widget}': {source}")]
    Bundle {
        widget: String,
        #[source]
        source: BundlerError,
    },

    #[error("Failed to hash outputs: {0}")]
    Hash(#[from] HashError),

    #[error("Failed to render template: {0}")]
    TemplateError(String),

    #[error("Failed to read {0}")]
    ReadError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Builds every selected widget into the output directory.
pub struct WidgetBuilder {
    config: BuildConfig,
    bundler: Arc<dyn Bundler>,
    templates: TemplateEngine,
}

impl WidgetBuilder {
    /// Create a new widget builder.
    pub fn new(config: BuildConfig, bundler: Arc<dyn Bundler>) -> Self {
        Self {
            config,
            bundler,
            templates: TemplateEngine::new(),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Run the whole pipeline.
    ///
    /// The first widget that fails to bundle aborts the run before anything
    /// is hashed or any HTML is written.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let out_dir = self.config.out_path();

        self.config.check_out_dir()?;
        let entries = self.select_entries()?;

        self.prepare_output_dir(&out_dir)?;

        let styles = StyleResolver::new(
            self.config.global_style_paths(),
            self.config.style_extensions.clone(),
        );
        for missing in styles.missing_globals() {
            tracing::warn!("Global stylesheet not found: {}", missing.display());
        }

        let mut built_names = Vec::with_capacity(entries.len());

        for entry in &entries {
            self.build_widget(entry, &styles, &out_dir).await?;
            built_names.push(entry.name.clone());
        }

        let report = ContentHasher::new(&self.config.version).hash_dir(&out_dir)?;

        let widgets = built_names
            .iter()
            .map(|name| self.emit_html(name, &report.hash, &out_dir))
            .collect::<Result<Vec<_>, _>>()?;

        let duration = start.elapsed();

        Ok(BuildResult {
            hash: report.hash,
            widgets,
            duration_ms: duration.as_millis() as u64,
            output_dir: out_dir,
        })
    }

    /// Discover entries and apply the target filter.
    fn select_entries(&self) -> Result<Vec<Entry>, BuildError> {
        let discovered =
            discover_entries(&self.config.source_path(), &self.config.entry_extensions)?;

        for target in &self.config.targets {
            if !discovered.iter().any(|e| &e.name == target) {
                tracing::warn!("Target '{}' does not match any widget entry", target);
            }
        }

        let selected: Vec<Entry> = discovered
            .into_iter()
            .filter(|e| self.config.targets.is_empty() || self.config.targets.contains(&e.name))
            .collect();

        let mut seen: HashMap<&str, &Path> = HashMap::new();
        for entry in &selected {
            if let Some(first) = seen.insert(&entry.name, &entry.path) {
                return Err(BuildError::DuplicateWidget {
                    name: entry.name.clone(),
                    first: first.display().to_string(),
                    second: entry.path.display().to_string(),
                });
            }
        }

        tracing::info!("Found {} widget entries", selected.len());

        Ok(selected)
    }

    /// Remove any previous output and recreate the directory.
    fn prepare_output_dir(&self, out_dir: &Path) -> Result<(), BuildError> {
        if out_dir.exists() {
            fs::remove_dir_all(out_dir).map_err(|e| {
                BuildError::WriteError(format!("{}: {}", out_dir.display(), e))
            })?;
        }

        fs::create_dir_all(out_dir)
            .map_err(|e| BuildError::WriteError(format!("{}: {}", out_dir.display(), e)))
    }

    /// Bundle one widget, waiting for the bundler to finish.
    async fn build_widget(
        &self,
        entry: &Entry,
        styles: &StyleResolver,
        out_dir: &Path,
    ) -> Result<(), BuildError> {
        let stylesheets = styles.resolve(entry)?;
        tracing::debug!(
            "Stylesheets for {}: {:?}",
            entry.name,
            stylesheets.paths()
        );

        match check_entry(entry) {
            Ok(contract) if !contract.is_satisfied() => tracing::warn!(
                "Widget '{}' exports neither `default` nor `App`; its default export will be undefined",
                entry.name
            ),
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not inspect exports of '{}': {}", entry.name, e),
        }

        let module = VirtualModule::new(entry, &stylesheets);
        tracing::debug!("Virtual entry {}:\n{}", module.id(), module.source());

        let request = BundleRequest {
            name: entry.name.clone(),
            module,
            out_dir: out_dir.to_path_buf(),
            asset_base: self.config.assets.base_url.clone(),
            minify: self.config.minify,
        };

        tracing::info!("Building {} ({})", entry.name, self.bundler.name());

        let bundler = Arc::clone(&self.bundler);
        let outcome = tokio::task::spawn_blocking(move || bundler.bundle(&request))
            .await
            .unwrap_or_else(|e| Err(BundlerError::Other(e.to_string())));

        outcome.map_err(|source| BuildError::Bundle {
            widget: entry.name.clone(),
            source,
        })?;

        tracing::info!("Built {}", entry.name);

        Ok(())
    }

    /// Write the pinned and live HTML documents for one widget.
    fn emit_html(&self, name: &str, hash: &str, out_dir: &Path) -> Result<BuiltWidget, BuildError> {
        let script = out_dir.join(hashed_file_name(&format!("{}.js", name), hash));
        let stylesheet = out_dir.join(hashed_file_name(&format!("{}.css", name), hash));
        let has_stylesheet = stylesheet.is_file();

        if !has_stylesheet {
            tracing::debug!("No stylesheet for {}; omitting <link>", name);
        }

        let page = WidgetPage {
            name: name.to_string(),
            hash: hash.to_string(),
            asset_base: self.config.assets.base_url.clone(),
            telemetry_url: self.config.assets.telemetry_url.clone(),
            has_stylesheet,
        };

        let html = self
            .templates
            .render_widget(&page)
            .map_err(|e| BuildError::TemplateError(e.to_string()))?;

        let html_pinned = out_dir.join(format!("{}-{}.html", name, hash));
        let html_live = out_dir.join(format!("{}.html", name));

        for path in [&html_pinned, &html_live] {
            fs::write(path, &html)
                .map_err(|e| BuildError::WriteError(format!("{}: {}", path.display(), e)))?;
            tracing::info!("Wrote {}", path.display());
        }

        Ok(BuiltWidget {
            name: name.to_string(),
            script,
            stylesheet: has_stylesheet.then_some(stylesheet),
            html_pinned,
            html_live,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetConfig;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    /// Writes the entry text as the script and concatenates every imported
    /// stylesheet, in import order, into the stylesheet.
    #[derive(Default)]
    struct FakeBundler {
        fail_on: Option<String>,
        calls: Mutex<Vec<String>>,
        asset_bases: Mutex<Vec<String>>,
    }

    impl FakeBundler {
        fn failing_on(name: &str) -> Self {
            Self {
                fail_on: Some(name.to_string()),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Bundler for FakeBundler {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn bundle(&self, request: &BundleRequest) -> Result<(), BundlerError> {
            self.calls.lock().unwrap().push(request.name.clone());
            self.asset_bases
                .lock()
                .unwrap()
                .push(request.asset_base.clone());

            if self.fail_on.as_deref() == Some(request.name.as_str()) {
                return Err(BundlerError::Other("forced failure".to_string()));
            }

            let script = fs::read_to_string(request.module.entry()).unwrap();
            fs::write(request.script_path(), script).unwrap();

            let css: String = request
                .module
                .effect_imports()
                .into_iter()
                .filter(|p| p.extension().is_some_and(|e| e == "css"))
                .map(|p| fs::read_to_string(p).unwrap())
                .collect();

            if !css.is_empty() {
                fs::write(request.stylesheet_path(), css).unwrap();
            }

            Ok(())
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Project with a global stylesheet and widgets `a` (with its own CSS)
    /// and `b` (no local CSS).
    fn project() -> TempDir {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        write(&src.join("index.css"), "body{color:red}\n");
        write(
            &src.join("components/a/index.tsx"),
            "export default function App() {}\n",
        );
        write(&src.join("components/a/a.css"), "body{color:blue}\n");
        write(&src.join("components/b/index.tsx"), "export function App() {}\n");
        temp
    }

    fn config(root: &Path) -> BuildConfig {
        BuildConfig {
            root: root.to_path_buf(),
            version: "1.2.3".to_string(),
            ..Default::default()
        }
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn builds_hashed_outputs_and_html() {
        let temp = project();
        let builder = WidgetBuilder::new(config(temp.path()), Arc::new(FakeBundler::default()));

        let result = builder.build().await.unwrap();
        let h = &result.hash;
        let out = temp.path().join("assets");

        assert_eq!(result.widgets.len(), 2);
        assert_eq!(
            file_names(&out),
            vec![
                format!("a-{h}.css"),
                format!("a-{h}.html"),
                format!("a-{h}.js"),
                "a.html".to_string(),
                format!("b-{h}.css"),
                format!("b-{h}.html"),
                format!("b-{h}.js"),
                "b.html".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn pinned_and_live_html_are_identical() {
        let temp = project();
        let builder = WidgetBuilder::new(config(temp.path()), Arc::new(FakeBundler::default()));

        let result = builder.build().await.unwrap();
        let widget = &result.widgets[0];

        let pinned = fs::read(&widget.html_pinned).unwrap();
        let live = fs::read(&widget.html_live).unwrap();
        assert_eq!(pinned, live);

        let html = String::from_utf8(live).unwrap();
        assert!(html.contains(&format!(
            r#"<script type="module" src="http://localhost:4444/assets/a-{}.js">"#,
            result.hash
        )));
        assert!(html.contains(r#"<meta name="widget-id" content="a">"#));
        assert!(html.contains(r#"<div id="a-root"></div>"#));
        assert!(!html.contains("telemetry-url"));
    }

    #[tokio::test]
    async fn global_styles_precede_local_styles() {
        let temp = project();
        let builder = WidgetBuilder::new(config(temp.path()), Arc::new(FakeBundler::default()));

        let result = builder.build().await.unwrap();
        let css_path = result.widgets[0].stylesheet.as_ref().unwrap();

        assert_eq!(
            fs::read_to_string(css_path).unwrap(),
            "body{color:red}\nbody{color:blue}\n"
        );
    }

    fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
        file_names(dir)
            .into_iter()
            .map(|name| {
                let bytes = fs::read(dir.join(&name)).unwrap();
                (name, bytes)
            })
            .collect()
    }

    #[tokio::test]
    async fn builds_are_deterministic() {
        let temp = project();
        let builder = WidgetBuilder::new(config(temp.path()), Arc::new(FakeBundler::default()));
        let out = temp.path().join("assets");

        let first = builder.build().await.unwrap();
        let first_files = snapshot(&out);
        let second = builder.build().await.unwrap();

        assert_eq!(first.hash, second.hash);
        assert_eq!(first_files.len(), 8);
        assert_eq!(first_files, snapshot(&out));
    }

    #[tokio::test]
    async fn hash_changes_with_version() {
        let temp = project();
        let first = WidgetBuilder::new(config(temp.path()), Arc::new(FakeBundler::default()))
            .build()
            .await
            .unwrap();

        let bumped = BuildConfig {
            version: "1.2.4".to_string(),
            ..config(temp.path())
        };
        let second = WidgetBuilder::new(bumped, Arc::new(FakeBundler::default()))
            .build()
            .await
            .unwrap();

        assert_ne!(first.hash, second.hash);
    }

    #[tokio::test]
    async fn failing_widget_aborts_before_hashing() {
        let temp = project();
        write(
            &temp.path().join("src/components/c/index.tsx"),
            "export default 3;\n",
        );
        let bundler = Arc::new(FakeBundler::failing_on("b"));
        let builder = WidgetBuilder::new(config(temp.path()), bundler.clone());

        let err = builder.build().await.unwrap_err();

        assert!(matches!(err, BuildError::Bundle { ref widget, .. } if widget == "b"));
        assert_eq!(bundler.calls(), vec!["a", "b"]);

        // Only the unhashed output of the widget built before the failure.
        let out = temp.path().join("assets");
        assert_eq!(file_names(&out), vec!["a.css", "a.js"]);
    }

    #[tokio::test]
    async fn wipes_stale_outputs() {
        let temp = project();
        let out = temp.path().join("assets");
        write(&out.join("old-0000.js"), "stale");
        write(&out.join("nested/old.css"), "stale");

        let builder = WidgetBuilder::new(config(temp.path()), Arc::new(FakeBundler::default()));
        builder.build().await.unwrap();

        assert!(!out.join("old-0000.js").exists());
        assert!(!out.join("nested").exists());
    }

    #[tokio::test]
    async fn omits_link_for_widget_without_css() {
        let temp = project();
        fs::remove_file(temp.path().join("src/index.css")).unwrap();

        let builder = WidgetBuilder::new(config(temp.path()), Arc::new(FakeBundler::default()));
        let result = builder.build().await.unwrap();

        let b = result.widgets.iter().find(|w| w.name == "b").unwrap();
        assert_eq!(b.stylesheet, None);
        assert!(!fs::read_to_string(&b.html_live).unwrap().contains("<link"));

        let a = result.widgets.iter().find(|w| w.name == "a").unwrap();
        assert!(fs::read_to_string(&a.html_live).unwrap().contains("<link"));
    }

    #[tokio::test]
    async fn targets_limit_the_build() {
        let temp = project();
        let bundler = Arc::new(FakeBundler::default());
        let config = BuildConfig {
            targets: vec!["b".to_string(), "missing".to_string()],
            ..config(temp.path())
        };

        let result = WidgetBuilder::new(config, bundler.clone())
            .build()
            .await
            .unwrap();

        assert_eq!(bundler.calls(), vec!["b"]);
        assert_eq!(result.widgets.len(), 1);
        assert!(!temp.path().join("assets/a.html").exists());
    }

    #[tokio::test]
    async fn duplicate_names_fail_before_touching_output() {
        let temp = project();
        write(
            &temp.path().join("src/other/a/index.jsx"),
            "export default 1;\n",
        );
        let out = temp.path().join("assets");
        write(&out.join("keep.txt"), "previous run");

        let bundler = Arc::new(FakeBundler::default());
        let err = WidgetBuilder::new(config(temp.path()), bundler.clone())
            .build()
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::DuplicateWidget { ref name, .. } if name == "a"));
        assert!(bundler.calls().is_empty());
        assert!(out.join("keep.txt").exists());
    }

    #[tokio::test]
    async fn refuses_to_wipe_the_project() {
        let temp = project();
        write(&temp.path().join("package.json"), r#"{"version":"1.2.3"}"#);
        let bundler = Arc::new(FakeBundler::default());

        for out_dir in [".", "src"] {
            let config = BuildConfig {
                out_dir: PathBuf::from(out_dir),
                ..config(temp.path())
            };

            let err = WidgetBuilder::new(config, bundler.clone())
                .build()
                .await
                .unwrap_err();

            assert!(matches!(err, BuildError::Config(_)));
        }

        assert!(bundler.calls().is_empty());
        assert!(temp.path().join("package.json").exists());
        assert!(temp.path().join("src/components/a/index.tsx").exists());
    }

    #[tokio::test]
    async fn embeds_configured_asset_urls() {
        let temp = project();
        let config = BuildConfig {
            assets: AssetConfig::new(
                Some("https://cdn.example.com/"),
                Some("https://telemetry.example.com"),
            ),
            ..config(temp.path())
        };

        let bundler = Arc::new(FakeBundler::default());
        let result = WidgetBuilder::new(config, bundler.clone())
            .build()
            .await
            .unwrap();

        assert_eq!(
            *bundler.asset_bases.lock().unwrap(),
            vec!["https://cdn.example.com/assets"; 2]
        );

        let html = fs::read_to_string(&result.widgets[1].html_pinned).unwrap();
        assert!(html.contains(r#"<meta name="widget-domain" content="https://cdn.example.com/assets">"#));
        assert!(html.contains(r#"<meta name="telemetry-url" content="https://telemetry.example.com">"#));
        assert!(html.contains(&format!(
            "https://cdn.example.com/assets/b-{}.js",
            result.hash
        )));
    }

    #[tokio::test]
    async fn empty_source_tree_builds_nothing() {
        let temp = tempdir().unwrap();
        let builder = WidgetBuilder::new(config(temp.path()), Arc::new(FakeBundler::default()));

        let result = builder.build().await.unwrap();

        assert!(result.widgets.is_empty());
        assert!(file_names(&temp.path().join("assets")).is_empty());
    }
}
