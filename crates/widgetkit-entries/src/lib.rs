//! Widget entry discovery and virtual entry synthesis.
//!
//! This crate finds widget entry modules in a source tree, works out which
//! stylesheets belong to each one, and generates the synthetic entry module
//! that the bundler is pointed at.

pub mod contract;
pub mod discovery;
pub mod styles;
pub mod virtual_entry;

pub use contract::{check_entry, ExportContract};
pub use discovery::{discover_entries, DiscoveryError, Entry};
pub use styles::{StyleResolver, StylesheetSet};
pub use virtual_entry::{synthesize_entry, VirtualModule, VIRTUAL_PREFIX};
