//! Build pipeline for widget bundles.
//!
//! Drives an external bundler once per widget, content-hashes the whole output
//! set, and writes the HTML documents a hosting runtime loads.

pub mod builder;
pub mod bundler;
pub mod config;
pub mod hasher;
pub mod templates;

pub use builder::{BuildError, BuildResult, BuiltWidget, WidgetBuilder};
pub use bundler::{BundleRequest, Bundler, BundlerError, EsbuildBundler};
pub use config::{read_package_version, AssetConfig, BuildConfig, DEFAULT_BASE_URL};
pub use hasher::{hashed_file_name, ContentHasher, HashError, HashReport, HASH_LEN};
pub use templates::{TemplateEngine, WidgetPage};
