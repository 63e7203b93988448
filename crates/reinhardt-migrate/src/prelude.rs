//! Convenience re-exports for common usage.
//!
//! ```ignore
//! use reinhardt_migrate::prelude::*;
//! ```

// Error types
pub use crate::error::{MigrateError, MigrateResult, MigrationError, RegistryError};

// Manifest types
pub use crate::manifest::{Manifest, ManifestEntry, ManifestParser};

// Registry and migration traits
pub use crate::migration::{ImportOutcome, Migration, MigrationContext, MigrationDefinition};
pub use crate::registry::{MigrationRegistration, MigrationRegistry, MigrationRegistryBuilder};

// Dispatch
pub use crate::dispatcher::{
	DispatchOptions, Dispatcher, ExecutionResult, ExecutionStatus, MigrationRun,
};

// Reporting
pub use crate::report::{BackendPayload, MigrationDetail, parse_backend_output};

// Command types
pub use crate::commands::{MigrateManifestArgs, MigrateManifestCommand, MigrateManifestOptions};
