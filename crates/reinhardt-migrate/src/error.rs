//! Error types for the migrate module.
//!
//! This module defines the error types used throughout the reinhardt-migrate crate.

use std::error::Error as StdError;

use thiserror::Error;

/// Errors that abort a `migrate-manifest` invocation or describe a single
/// migration's failure.
#[derive(Debug, Error)]
pub enum MigrateError {
	/// The manifest path does not resolve to a readable file.
	#[error("The manifest file does not exist: {0}")]
	ManifestNotFound(String),

	/// The manifest content is not a well-formed sequence of migration entries.
	#[error("The manifest file is malformed ({location}): {message}")]
	ManifestMalformed {
		/// Where the problem was found (line/column or entry position).
		location: String,
		/// What is wrong with the document.
		message: String,
	},

	/// One or more manifest entries reference unknown migration identifiers.
	#[error("The following migrations were not found: {}", .ids.join(", "))]
	MigrationsNotFound {
		/// Every missing identifier, in manifest order.
		ids: Vec<String>,
	},

	/// A single migration's own logic failed.
	#[error("Migration {id} failed: {cause}")]
	MigrationExecutionFailed {
		/// Identifier of the failed migration.
		id: String,
		/// Underlying cause reported by the migration.
		cause: String,
	},

	/// I/O operation failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl MigrateError {
	/// Creates a malformed-manifest error.
	pub fn malformed(location: impl Into<String>, message: impl Into<String>) -> Self {
		Self::ManifestMalformed {
			location: location.into(),
			message: message.into(),
		}
	}

	/// Returns true for errors raised before any migration could run.
	pub fn is_structural(&self) -> bool {
		matches!(
			self,
			Self::ManifestNotFound(_)
				| Self::ManifestMalformed { .. }
				| Self::MigrationsNotFound { .. }
		)
	}
}

/// Result type alias for migrate operations.
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Errors raised while building a [`MigrationRegistry`](crate::registry::MigrationRegistry).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
	/// The same identifier was registered twice.
	#[error("Migration already registered: {0}")]
	DuplicateMigration(String),

	/// A definition reported an empty identifier.
	#[error("Migration identifier must not be empty")]
	EmptyIdentifier,

	/// A definition reported an identifier with surrounding whitespace.
	///
	/// Manifest ids are trimmed, so such a definition could never be matched.
	#[error("Migration identifier has surrounding whitespace: {0:?}")]
	UntrimmedIdentifier(String),
}

/// Failure reported by a migration implementation.
///
/// Returned from [`MigrationDefinition::instantiate`](crate::migration::MigrationDefinition::instantiate)
/// and [`Migration::import`](crate::migration::Migration::import). The dispatcher records it
/// on the entry's result and moves on.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct MigrationError {
	message: String,
	#[source]
	source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl MigrationError {
	/// Creates an error from a message.
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			source: None,
		}
	}

	/// Creates an error wrapping an underlying cause.
	pub fn with_source(
		message: impl Into<String>,
		source: impl StdError + Send + Sync + 'static,
	) -> Self {
		Self {
			message: message.into(),
			source: Some(Box::new(source)),
		}
	}

	/// Returns the message without the source chain.
	pub fn message(&self) -> &str {
		&self.message
	}

	/// Renders the message followed by every source in the chain.
	pub fn cause_chain(&self) -> String {
		let mut rendered = self.message.clone();
		let mut current = self.source();
		while let Some(cause) = current {
			rendered.push_str(": ");
			rendered.push_str(&cause.to_string());
			current = cause.source();
		}
		rendered
	}
}
