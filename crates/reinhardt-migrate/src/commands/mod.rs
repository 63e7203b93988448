//! Management commands.

mod migrate_manifest;

pub use migrate_manifest::{MigrateManifestArgs, MigrateManifestCommand, MigrateManifestOptions};
