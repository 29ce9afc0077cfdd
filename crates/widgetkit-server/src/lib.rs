//! Development tooling for widget bundles.
//!
//! Serves the output directory to a hosting runtime and rebuilds every
//! widget when the source tree changes.

pub mod dev;
pub mod server;
pub mod watcher;

pub use dev::{DevServer, DevServerConfig};
pub use server::{asset_router, AssetServer, AssetServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
