//! Manifest-driven legacy data migration for the Reinhardt framework.
//!
//! This crate runs a list of named migrations, read from a YAML manifest,
//! against a registry of migration definitions provided by the host:
//!
//! - **Manifest**: Parse an ordered list of migration ids with optional configuration overrides
//! - **Registry**: Immutable lookup table of [`MigrationDefinition`]s
//! - **Dispatcher**: Validate every id, then run the migrations one by one in manifest order
//! - **Report**: Structured per-migration outcomes for callers and scripts
//!
//! # Quick Start
//!
//! Create a manifest file (`manifest.yml`):
//!
//! ```yaml
//! - d6_action_settings
//! - d6_file:
//!     source:
//!       conf_path: sites/assets
//!     destination:
//!       source_base_path: destination/base/path
//! ```
//!
//! Run it:
//!
//! ```ignore
//! use reinhardt_migrate::prelude::*;
//!
//! let registry = MigrationRegistry::from_inventory()?;
//! let manifest = ManifestParser::new().parse_file(Path::new("manifest.yml"))?;
//! let run = Dispatcher::new(&registry)
//!     .with_options(DispatchOptions::new().with_legacy_db_url("mysql://legacy/d6"))
//!     .run(&manifest.entries);
//!
//! if let Some(error) = run.unresolved_error() {
//!     eprintln!("{}", error);
//! }
//! ```
//!
//! # Architecture
//!
//! - [`ManifestParser`](manifest::ManifestParser) - Structural parsing; never consults the registry
//! - [`MigrationRegistry`](registry::MigrationRegistry) - Built explicitly or from `inventory` submissions
//! - [`merge_configuration`](config::merge_configuration) - Deep merge of overrides onto defaults
//! - [`Dispatcher`](dispatcher::Dispatcher) - Fail-fast resolution, sequential execution
//! - [`BackendPayload`](report::BackendPayload) - Machine-parseable run report
//! - [`MigrateManifestCommand`](commands::MigrateManifestCommand) - Parse and dispatch in one call

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod manifest;
pub mod migration;
pub mod prelude;
pub mod registry;
pub mod report;

// Re-export commonly used types at crate root
pub use dispatcher::{
	DispatchOptions, Dispatcher, ExecutionResult, ExecutionStatus, MigrationRun,
};
pub use error::{MigrateError, MigrateResult, MigrationError, RegistryError};
pub use manifest::{Manifest, ManifestEntry, ManifestParser};
pub use migration::{ImportOutcome, Migration, MigrationContext, MigrationDefinition};
pub use registry::{MigrationRegistration, MigrationRegistry};

// Re-exported so hosts can submit registrations without depending on inventory directly
pub use inventory;
