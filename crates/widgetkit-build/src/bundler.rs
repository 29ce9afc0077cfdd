//! Bundler capability and the esbuild-backed implementation.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use widgetkit_entries::VirtualModule;

/// Stylesheet extensions esbuild has no built-in loader for, parsed as CSS.
const CSS_LOADER_EXTENSIONS: &[&str] = &["pcss"];

/// Asset extensions copied out as separate, content-named files.
const FILE_LOADER_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "woff", "woff2", "ttf", "otf", "eot",
];

/// One widget's bundling job.
#[derive(Debug, Clone)]
pub struct BundleRequest {
    /// Widget name; the script is written as `{name}.js` and the stylesheet
    /// as `{name}.css`
    pub name: String,

    /// Synthesized entry module, the sole root of the build
    pub module: VirtualModule,

    /// Shared output directory
    pub out_dir: PathBuf,

    /// Public URL of the output directory, prefixed to emitted asset URLs
    pub asset_base: String,

    /// Minify the output
    pub minify: bool,
}

impl BundleRequest {
    pub fn script_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.js", self.name))
    }

    pub fn stylesheet_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}.css", self.name))
    }
}

/// Errors that can occur while bundling one widget.
#[derive(Debug, thiserror::Error)]
pub enum BundlerError {
    #[error("Failed to launch {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Failed to pass virtual entry to bundler: {0}")]
    Stdin(std::io::Error),

    #[error("{command} exited with {status}\n{stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Bundler error: {0}")]
    Other(String),
}

/// Compiles a module graph rooted at a virtual entry into a script and
/// stylesheet pair.
///
/// Implementations must:
/// - produce exactly one script, `{name}.js`, with dynamic imports inlined
/// - name the stylesheet built from imported CSS `{name}.css`
/// - give any other emitted asset a content-derived name
/// - never delete files already present in the output directory
pub trait Bundler: Send + Sync {
    /// Bundler identifier (e.g., "esbuild")
    fn name(&self) -> &'static str;

    /// Build one widget, blocking until the bundler finishes.
    fn bundle(&self, request: &BundleRequest) -> Result<(), BundlerError>;
}

/// Runs the `esbuild` CLI, feeding it the virtual entry on stdin.
#[derive(Debug, Clone)]
pub struct EsbuildBundler {
    /// Executable to run
    command: String,

    /// JavaScript language target
    target: String,
}

impl EsbuildBundler {
    /// Create a bundler that runs `command` (e.g., `esbuild` or a path into
    /// `node_modules/.bin`).
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            target: "es2022".to_string(),
        }
    }

    /// Set the JavaScript language target.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Command-line arguments for one request.
    ///
    /// No `--splitting`: esbuild then inlines dynamic imports into the single
    /// entry script. CSS imported from the entry lands beside `--outfile`
    /// with the same stem.
    pub fn args(&self, request: &BundleRequest) -> Vec<String> {
        let mut args = vec![
            "--bundle".to_string(),
            format!("--sourcefile={}", request.module.id()),
            "--format=esm".to_string(),
            "--platform=browser".to_string(),
            format!("--target={}", self.target),
            "--jsx=automatic".to_string(),
            "--define:process.env.NODE_ENV=\"production\"".to_string(),
            format!("--outfile={}", request.script_path().display()),
            "--asset-names=[name]-[hash]".to_string(),
            format!("--public-path={}", request.asset_base),
        ];

        for ext in CSS_LOADER_EXTENSIONS {
            args.push(format!("--loader:.{}=css", ext));
        }

        for ext in FILE_LOADER_EXTENSIONS {
            args.push(format!("--loader:.{}=file", ext));
        }

        if request.minify {
            args.push("--minify".to_string());
        }

        args.push("--log-level=warning".to_string());

        args
    }
}

impl Default for EsbuildBundler {
    fn default() -> Self {
        Self::new("esbuild")
    }
}

impl Bundler for EsbuildBundler {
    fn name(&self) -> &'static str {
        "esbuild"
    }

    fn bundle(&self, request: &BundleRequest) -> Result<(), BundlerError> {
        let mut child = Command::new(&self.command)
            .args(self.args(request))
            .current_dir(request.module.resolve_dir())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BundlerError::Spawn {
                command: self.command.clone(),
                source: e,
            })?;

        // Dropping stdin closes the pipe so esbuild starts building.
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.module.source().as_bytes())
                .map_err(BundlerError::Stdin)?;
        }

        let output = child.wait_with_output().map_err(|e| BundlerError::Spawn {
            command: self.command.clone(),
            source: e,
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(BundlerError::Failed {
                command: self.command.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        if !stderr.is_empty() {
            tracing::warn!("{} ({}): {}", self.name(), request.name, stderr);
        }

        Ok(())
    }
}
