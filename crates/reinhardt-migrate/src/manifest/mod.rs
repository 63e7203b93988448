//! Manifest files naming the migrations to run.
//!
//! A manifest is a YAML sequence. Each item is a bare migration id or a
//! single-key mapping from the id to configuration overrides:
//!
//! ```yaml
//! - d6_action_settings
//! - d6_file:
//!     source:
//!       conf_path: sites/assets
//! ```

mod entry;
mod parser;

pub use entry::{Manifest, ManifestEntry};
pub use parser::ManifestParser;
