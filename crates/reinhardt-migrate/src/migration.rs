//! Migration traits implemented by the host system.
//!
//! A [`MigrationDefinition`] is registered once and produces a fresh
//! [`Migration`] for every run, configured with the merged configuration.

use std::path::Path;

use serde_json::Value;

use crate::error::MigrationError;

/// A registered migration: identifier, default configuration and factory.
///
/// Implement this for each migration that should be reachable from a manifest.
///
/// # Example
///
/// ```
/// use reinhardt_migrate::{Migration, MigrationContext, MigrationDefinition, MigrationError, ImportOutcome};
/// use serde_json::{Value, json};
///
/// struct ActionSettings;
///
/// struct ActionSettingsMigration;
///
/// impl Migration for ActionSettingsMigration {
///     fn import(&mut self, ctx: &mut MigrationContext<'_>) -> Result<ImportOutcome, MigrationError> {
///         ctx.log("copied actions_max_stack");
///         Ok(ImportOutcome::imported(1))
///     }
/// }
///
/// impl MigrationDefinition for ActionSettings {
///     fn id(&self) -> &str { "d6_action_settings" }
///     fn default_configuration(&self) -> Value {
///         json!({"source": {"variables": ["actions_max_stack"]}})
///     }
///     fn instantiate(&self, _configuration: Value) -> Result<Box<dyn Migration>, MigrationError> {
///         Ok(Box::new(ActionSettingsMigration))
///     }
/// }
/// ```
pub trait MigrationDefinition: Send + Sync {
	/// Returns the unique migration identifier (e.g., "d6_file").
	fn id(&self) -> &str;

	/// Returns a human-readable label.
	fn label(&self) -> Option<&str> {
		None
	}

	/// Returns the default configuration as a JSON object.
	///
	/// Manifest overrides are deep-merged onto this value.
	fn default_configuration(&self) -> Value;

	/// Builds an executable migration from the merged configuration.
	///
	/// Must not have side effects: simulate mode calls this too.
	fn instantiate(&self, configuration: Value) -> Result<Box<dyn Migration>, MigrationError>;
}

/// An executable migration instance.
pub trait Migration: Send {
	/// Reads from the legacy source and writes into the destination store.
	fn import(&mut self, ctx: &mut MigrationContext<'_>) -> Result<ImportOutcome, MigrationError>;
}

/// What a successful import did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
	/// Rows were processed and written.
	Imported {
		/// Number of processed items.
		processed: u64,
	},

	/// The migration decided there was nothing to do.
	Skipped {
		/// Why the migration skipped.
		reason: String,
	},
}

impl ImportOutcome {
	/// Shorthand for [`ImportOutcome::Imported`].
	pub fn imported(processed: u64) -> Self {
		Self::Imported { processed }
	}

	/// Shorthand for [`ImportOutcome::Skipped`].
	pub fn skipped(reason: impl Into<String>) -> Self {
		Self::Skipped {
			reason: reason.into(),
		}
	}
}

/// Per-migration view of the run handed to [`Migration::import`].
#[derive(Debug)]
pub struct MigrationContext<'a> {
	migration_id: &'a str,
	legacy_db_url: Option<&'a str>,
	site_root: Option<&'a Path>,
	site_uri: Option<&'a str>,
	messages: Vec<String>,
}

impl<'a> MigrationContext<'a> {
	/// Creates a context for one migration.
	pub fn new(migration_id: &'a str) -> Self {
		Self {
			migration_id,
			legacy_db_url: None,
			site_root: None,
			site_uri: None,
			messages: Vec::new(),
		}
	}

	/// Sets the legacy database connection string.
	pub fn with_legacy_db_url(mut self, url: Option<&'a str>) -> Self {
		self.legacy_db_url = url;
		self
	}

	/// Sets the destination site root and identifier.
	pub fn with_site(mut self, root: Option<&'a Path>, uri: Option<&'a str>) -> Self {
		self.site_root = root;
		self.site_uri = uri;
		self
	}

	/// Returns the identifier of the running migration.
	pub fn migration_id(&self) -> &str {
		self.migration_id
	}

	/// Returns the legacy database connection string, if configured.
	pub fn legacy_db_url(&self) -> Option<&str> {
		self.legacy_db_url
	}

	/// Returns the destination site root, if configured.
	pub fn site_root(&self) -> Option<&Path> {
		self.site_root
	}

	/// Returns the destination site identifier, if configured.
	pub fn site_uri(&self) -> Option<&str> {
		self.site_uri
	}

	/// Appends a line to the migration's result messages.
	pub fn log(&mut self, line: impl Into<String>) {
		let line = line.into();
		tracing::debug!(migration = self.migration_id, "{}", line);
		self.messages.push(line);
	}

	/// Returns the lines logged so far.
	pub fn messages(&self) -> &[String] {
		&self.messages
	}

	pub(crate) fn into_messages(self) -> Vec<String> {
		self.messages
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_context_collects_messages() {
		let mut ctx = MigrationContext::new("d6_file")
			.with_legacy_db_url(Some("mysql://legacy/d6"))
			.with_site(Some(Path::new("/var/www")), Some("default"));

		ctx.log("first");
		ctx.log(String::from("second"));

		assert_eq!(ctx.migration_id(), "d6_file");
		assert_eq!(ctx.legacy_db_url(), Some("mysql://legacy/d6"));
		assert_eq!(ctx.site_root(), Some(Path::new("/var/www")));
		assert_eq!(ctx.site_uri(), Some("default"));
		assert_eq!(ctx.messages(), ["first", "second"]);
		assert_eq!(ctx.into_messages(), vec!["first", "second"]);
	}

	#[rstest]
	fn test_import_outcome_constructors() {
		assert_eq!(
			ImportOutcome::imported(3),
			ImportOutcome::Imported { processed: 3 }
		);
		assert_eq!(
			ImportOutcome::skipped("nothing to do"),
			ImportOutcome::Skipped {
				reason: "nothing to do".to_string()
			}
		);
	}
}
