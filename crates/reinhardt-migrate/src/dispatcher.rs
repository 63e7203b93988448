//! Manifest dispatcher.
//!
//! Resolves every manifest entry against the registry, then executes the
//! entries one at a time in manifest order. Unknown identifiers abort the
//! run before anything executes; a failing migration is recorded and the
//! run moves on unless `halt_on_failure` is set.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{merge_configuration, redact_url, render_configuration};
use crate::error::{MigrateError, MigrationError};
use crate::manifest::ManifestEntry;
use crate::migration::{ImportOutcome, MigrationContext, MigrationDefinition};
use crate::registry::MigrationRegistry;

/// Message recorded on entries executed in simulate mode.
pub const SIMULATED_MESSAGE: &str = "Simulated: no changes were written";

/// Options controlling a dispatch run.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
	/// Merge configuration and log intent without importing.
	pub simulate: bool,

	/// Stop after the first failed migration.
	pub halt_on_failure: bool,

	/// Connection string to the legacy source database.
	pub legacy_db_url: Option<String>,

	/// Destination site root.
	pub site_root: Option<PathBuf>,

	/// Destination site identifier.
	pub site_uri: Option<String>,

	/// Raised from outside to stop the run between migrations.
	pub interrupt: Option<Arc<AtomicBool>>,
}

impl DispatchOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets simulate mode.
	pub fn with_simulate(mut self, simulate: bool) -> Self {
		self.simulate = simulate;
		self
	}

	/// Sets halt-on-first-failure.
	pub fn with_halt_on_failure(mut self, halt: bool) -> Self {
		self.halt_on_failure = halt;
		self
	}

	/// Sets the legacy database connection string.
	pub fn with_legacy_db_url(mut self, url: impl Into<String>) -> Self {
		self.legacy_db_url = Some(url.into());
		self
	}

	/// Sets the destination site root.
	pub fn with_site_root(mut self, root: impl Into<PathBuf>) -> Self {
		self.site_root = Some(root.into());
		self
	}

	/// Sets the destination site identifier.
	pub fn with_site_uri(mut self, uri: impl Into<String>) -> Self {
		self.site_uri = Some(uri.into());
		self
	}

	/// Sets the interrupt flag checked between migrations.
	pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
		self.interrupt = Some(flag);
		self
	}

	fn interrupted(&self) -> bool {
		self.interrupt
			.as_ref()
			.is_some_and(|flag| flag.load(Ordering::SeqCst))
	}
}

/// Outcome status of a single manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
	/// The migration imported its data.
	Imported,
	/// The migration did not write anything (simulate mode or nothing to do).
	Skipped,
	/// The migration failed.
	Failed,
}

impl fmt::Display for ExecutionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Imported => write!(f, "imported"),
			Self::Skipped => write!(f, "skipped"),
			Self::Failed => write!(f, "failed"),
		}
	}
}

/// Result of executing one manifest entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
	id: String,
	status: ExecutionStatus,
	messages: Vec<String>,
	configuration: Value,
	processed: u64,
	error: Option<String>,
}

impl ExecutionResult {
	/// Returns the migration identifier.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Returns the outcome status.
	pub fn status(&self) -> ExecutionStatus {
		self.status
	}

	/// Returns the messages logged for this entry.
	pub fn messages(&self) -> &[String] {
		&self.messages
	}

	/// Returns the merged configuration the migration ran with.
	pub fn configuration(&self) -> &Value {
		&self.configuration
	}

	/// Returns the number of items the migration processed.
	pub fn processed(&self) -> u64 {
		self.processed
	}

	/// Returns the failure cause, if the entry failed.
	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}

	/// Returns the failure as a [`MigrateError`], if the entry failed.
	pub fn failure(&self) -> Option<MigrateError> {
		self.error
			.as_ref()
			.map(|cause| MigrateError::MigrationExecutionFailed {
				id: self.id.clone(),
				cause: cause.clone(),
			})
	}
}

/// Aggregate outcome of one dispatch invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationRun {
	results: Vec<ExecutionResult>,
	unresolved: Vec<String>,
	log: Vec<String>,
	error_log: Vec<String>,
	halted: bool,
	interrupted: bool,
}

impl MigrationRun {
	/// Returns per-entry results in execution order.
	pub fn results(&self) -> &[ExecutionResult] {
		&self.results
	}

	/// Returns the result for a migration identifier.
	pub fn result(&self, id: &str) -> Option<&ExecutionResult> {
		self.results.iter().find(|result| result.id == id)
	}

	/// Returns identifiers missing from the registry, in manifest order.
	pub fn unresolved(&self) -> &[String] {
		&self.unresolved
	}

	/// Returns the diagnostic log lines in order.
	pub fn log(&self) -> &[String] {
		&self.log
	}

	/// Returns the error log lines in order.
	pub fn error_log(&self) -> &[String] {
		&self.error_log
	}

	/// Returns true if the run stopped after a failure.
	pub fn halted(&self) -> bool {
		self.halted
	}

	/// Returns true if the run was interrupted between migrations.
	pub fn interrupted(&self) -> bool {
		self.interrupted
	}

	/// Returns the results that failed.
	pub fn failed(&self) -> impl Iterator<Item = &ExecutionResult> {
		self.results
			.iter()
			.filter(|result| result.status == ExecutionStatus::Failed)
	}

	/// Counts results with the given status.
	pub fn count(&self, status: ExecutionStatus) -> usize {
		self.results
			.iter()
			.filter(|result| result.status == status)
			.count()
	}

	/// Returns the unresolved-identifier error, if any identifier was missing.
	pub fn unresolved_error(&self) -> Option<MigrateError> {
		if self.unresolved.is_empty() {
			None
		} else {
			Some(MigrateError::MigrationsNotFound {
				ids: self.unresolved.clone(),
			})
		}
	}

	/// Returns true when every id resolved and the run was neither halted
	/// nor interrupted. Failures without halt-on-failure still count as success.
	pub fn is_success(&self) -> bool {
		self.unresolved.is_empty() && !self.halted && !self.interrupted
	}
}

/// Executes manifest entries against a registry.
///
/// # Example
///
/// ```ignore
/// let registry = MigrationRegistry::from_inventory()?;
/// let manifest = ManifestParser::new().parse_file(Path::new("manifest.yml"))?;
/// let run = Dispatcher::new(&registry)
///     .with_options(DispatchOptions::new().with_simulate(true))
///     .run(&manifest.entries);
/// ```
#[derive(Debug)]
pub struct Dispatcher<'a> {
	registry: &'a MigrationRegistry,
	options: DispatchOptions,
}

impl<'a> Dispatcher<'a> {
	/// Creates a dispatcher with default options.
	pub fn new(registry: &'a MigrationRegistry) -> Self {
		Self {
			registry,
			options: DispatchOptions::default(),
		}
	}

	/// Replaces the dispatch options.
	pub fn with_options(mut self, options: DispatchOptions) -> Self {
		self.options = options;
		self
	}

	/// Returns the dispatch options.
	pub fn options(&self) -> &DispatchOptions {
		&self.options
	}

	/// Runs the entries and returns the aggregate outcome.
	pub fn run(&self, entries: &[ManifestEntry]) -> MigrationRun {
		let mut run = MigrationRun::default();

		let resolved = match self.resolve(entries) {
			Ok(resolved) => resolved,
			Err(unresolved) => {
				let error = MigrateError::MigrationsNotFound {
					ids: unresolved.clone(),
				};
				tracing::warn!(missing = ?unresolved, "{}", error);
				run.error_log.push(error.to_string());
				run.unresolved = unresolved;
				return run;
			}
		};

		if self.options.simulate {
			run.log
				.push("Simulate mode: no changes will be written".to_string());
		}
		if let Some(url) = &self.options.legacy_db_url {
			let line = format!("Legacy database: {}", redact_url(url));
			tracing::debug!("{}", line);
			run.log.push(line);
		}

		for (entry, definition) in resolved {
			if self.options.interrupted() {
				let line = format!("Interrupted before {}", entry.id());
				tracing::warn!("{}", line);
				run.error_log.push(line);
				run.interrupted = true;
				break;
			}

			let result = self.execute(entry, definition.as_ref());
			run.log.extend(result.messages.iter().cloned());

			if let Some(error) = result.failure() {
				tracing::warn!(migration = entry.id(), "{}", error);
				run.error_log.push(error.to_string());
				let halt = self.options.halt_on_failure;
				run.results.push(result);
				if halt {
					let line = format!("Halting after failed migration {}", entry.id());
					run.error_log.push(line);
					run.halted = true;
					break;
				}
				continue;
			}

			run.results.push(result);
		}

		tracing::info!(
			imported = run.count(ExecutionStatus::Imported),
			skipped = run.count(ExecutionStatus::Skipped),
			failed = run.count(ExecutionStatus::Failed),
			"Migration run finished"
		);
		run
	}

	/// Pairs each entry with its definition, or returns every missing id.
	fn resolve<'e>(
		&self,
		entries: &'e [ManifestEntry],
	) -> Result<Vec<(&'e ManifestEntry, Arc<dyn MigrationDefinition>)>, Vec<String>> {
		let mut resolved = Vec::with_capacity(entries.len());
		let mut missing = Vec::new();
		let mut seen_missing = HashSet::new();

		for entry in entries {
			match self.registry.lookup(entry.id()) {
				Some(definition) => resolved.push((entry, definition)),
				None => {
					if seen_missing.insert(entry.id()) {
						missing.push(entry.id().to_string());
					}
				}
			}
		}

		if missing.is_empty() {
			Ok(resolved)
		} else {
			Err(missing)
		}
	}

	fn execute(&self, entry: &ManifestEntry, definition: &dyn MigrationDefinition) -> ExecutionResult {
		let id = entry.id();
		let importing = format!("Importing: {}", id);
		tracing::info!("{}", importing);

		let configuration = merge_configuration(&definition.default_configuration(), entry.overrides());
		tracing::debug!(migration = id, configuration = %configuration, "Merged configuration");

		let mut messages = vec![importing];
		if self.options.simulate {
			messages.extend(render_configuration(&configuration));
		}

		let mut migration = match definition.instantiate(configuration.clone()) {
			Ok(migration) => migration,
			Err(error) => return failed(id, messages, configuration, &error),
		};

		if self.options.simulate {
			messages.push(SIMULATED_MESSAGE.to_string());
			return ExecutionResult {
				id: id.to_string(),
				status: ExecutionStatus::Skipped,
				messages,
				configuration,
				processed: 0,
				error: None,
			};
		}

		let mut ctx = MigrationContext::new(id)
			.with_legacy_db_url(self.options.legacy_db_url.as_deref())
			.with_site(
				self.options.site_root.as_deref(),
				self.options.site_uri.as_deref(),
			);
		let outcome = migration.import(&mut ctx);
		messages.extend(ctx.into_messages());

		match outcome {
			Ok(ImportOutcome::Imported { processed }) => ExecutionResult {
				id: id.to_string(),
				status: ExecutionStatus::Imported,
				messages,
				configuration,
				processed,
				error: None,
			},
			Ok(ImportOutcome::Skipped { reason }) => {
				messages.push(format!("Skipped: {}", reason));
				ExecutionResult {
					id: id.to_string(),
					status: ExecutionStatus::Skipped,
					messages,
					configuration,
					processed: 0,
					error: None,
				}
			}
			Err(error) => failed(id, messages, configuration, &error),
		}
	}
}

fn failed(
	id: &str,
	messages: Vec<String>,
	configuration: Value,
	error: &MigrationError,
) -> ExecutionResult {
	ExecutionResult {
		id: id.to_string(),
		status: ExecutionStatus::Failed,
		messages,
		configuration,
		processed: 0,
		error: Some(error.cause_chain()),
	}
}

/// Runs `entries` against `registry` with `options`.
pub fn run(
	entries: &[ManifestEntry],
	registry: &MigrationRegistry,
	options: DispatchOptions,
) -> MigrationRun {
	Dispatcher::new(registry).with_options(options).run(entries)
}
