//! migrate-manifest command implementation.
//!
//! This command runs the migrations named by a manifest file.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::dispatcher::{DispatchOptions, Dispatcher, MigrationRun};
use crate::error::MigrateResult;
use crate::manifest::{Manifest, ManifestParser};
use crate::registry::MigrationRegistry;

/// Arguments for the migrate-manifest command.
#[derive(Debug, Clone, Default)]
pub struct MigrateManifestArgs {
	/// Manifest file path.
	pub manifest_path: PathBuf,
}

/// Options for the migrate-manifest command.
#[derive(Debug, Clone, Default)]
pub struct MigrateManifestOptions {
	/// Destination site root.
	pub root: Option<PathBuf>,

	/// Destination site identifier.
	pub uri: Option<String>,

	/// Connection string to the legacy source database.
	pub legacy_db_url: Option<String>,

	/// Merge configuration and log intent without importing.
	pub simulate: bool,

	/// Stop after the first failed migration.
	pub halt_on_failure: bool,

	/// Raised from outside to stop between migrations.
	pub interrupt: Option<Arc<AtomicBool>>,
}

impl MigrateManifestOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the destination site root.
	pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
		self.root = Some(root.into());
		self
	}

	/// Sets the destination site identifier.
	pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	/// Sets the legacy database connection string.
	pub fn with_legacy_db_url(mut self, url: impl Into<String>) -> Self {
		self.legacy_db_url = Some(url.into());
		self
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

	/// Sets the interrupt flag.
	pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
		self.interrupt = Some(flag);
		self
	}

	fn dispatch_options(&self) -> DispatchOptions {
		DispatchOptions {
			simulate: self.simulate,
			halt_on_failure: self.halt_on_failure,
			legacy_db_url: self.legacy_db_url.clone(),
			site_root: self.root.clone(),
			site_uri: self.uri.clone(),
			interrupt: self.interrupt.clone(),
		}
	}
}

/// The migrate-manifest command.
///
/// # Example
///
/// ```ignore
/// let command = MigrateManifestCommand::new(MigrationRegistry::from_inventory()?);
/// let args = MigrateManifestArgs {
///     manifest_path: PathBuf::from("manifest.yml"),
/// };
/// let run = command.execute(args, MigrateManifestOptions::new().with_simulate(true))?;
/// println!("{}", reinhardt_migrate::report::summarize(&run));
/// ```
#[derive(Debug)]
pub struct MigrateManifestCommand {
	registry: MigrationRegistry,
}

impl MigrateManifestCommand {
	/// Creates a new command backed by `registry`.
	pub fn new(registry: MigrationRegistry) -> Self {
		Self { registry }
	}

	/// Returns the command name.
	pub fn name(&self) -> &str {
		"migrate-manifest"
	}

	/// Returns the command description.
	pub fn description(&self) -> &str {
		"Runs the migrations named in a manifest file, in manifest order"
	}

	/// Returns the command help text.
	pub fn help(&self) -> &str {
		r#"
Usage: migrate-manifest [options] manifest

Runs the migrations named in a YAML manifest file, in manifest order.

Arguments:
  manifest               Path to the manifest file

Options:
  --root PATH            Destination site root
  --uri URI              Destination site identifier
  --legacy-db-url URL    Connection string to the legacy database
  --simulate             Merge configuration and log intent without writing
  --halt-on-failure      Stop after the first failed migration
  --backend              Print a machine-parseable report
  -y, --yes              Do not prompt for confirmation
"#
	}

	/// Returns the registry this command dispatches against.
	pub fn registry(&self) -> &MigrationRegistry {
		&self.registry
	}

	/// Executes the command.
	///
	/// # Errors
	///
	/// Returns `ManifestNotFound` or `ManifestMalformed` before anything runs.
	/// Unknown migrations and per-migration failures are reported on the
	/// returned [`MigrationRun`].
	pub fn execute(
		&self,
		args: MigrateManifestArgs,
		options: MigrateManifestOptions,
	) -> MigrateResult<MigrationRun> {
		let manifest = ManifestParser::new().parse_file(&args.manifest_path)?;
		Ok(self.execute_manifest(&manifest, options))
	}

	/// Dispatches an already parsed manifest.
	pub fn execute_manifest(
		&self,
		manifest: &Manifest,
		options: MigrateManifestOptions,
	) -> MigrationRun {
		tracing::info!(
			manifest = manifest.source.as_deref().unwrap_or("<memory>"),
			entries = manifest.len(),
			simulate = options.simulate,
			"Running migration manifest"
		);

		let dispatcher = Dispatcher::new(&self.registry).with_options(options.dispatch_options());
		dispatcher.run(&manifest.entries)
	}
}
