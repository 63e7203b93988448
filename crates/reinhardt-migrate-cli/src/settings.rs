//! Layered settings for the migrate-manifest command.
//!
//! Sources are merged in priority order:
//! command-line flags > environment variables > TOML file > defaults.

use std::fs;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Cli;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "MIGRATE_";

/// Settings file looked up below the site root when `--settings` is absent.
pub const DEFAULT_SETTINGS_FILE: &str = "migrate.toml";

const BOOLEAN_KEYS: &[&str] = &["halt_on_failure", "simulate", "backend"];
const STRING_KEYS: &[&str] = &["legacy_db_url", "uri"];

/// Resolved settings for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrateSettings {
	/// Connection string to the legacy source database.
	pub legacy_db_url: Option<String>,

	/// Stop after the first failed migration.
	pub halt_on_failure: bool,

	/// Merge configuration and log intent without importing.
	pub simulate: bool,

	/// Print a machine-parseable report on stdout.
	pub backend: bool,

	/// Destination site identifier.
	pub uri: Option<String>,
}

/// Error type for settings sources
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("IO error reading {path}: {source}")]
	Io {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Settings file does not exist: {0}")]
	Missing(String),

	#[error("TOML error in {path}: {source}")]
	Toml {
		path: String,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid settings: {0}")]
	Invalid(String),
}

/// Trait for settings sources
pub trait SettingsSource {
	/// Load settings from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SettingsError>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

/// TOML settings file.
pub struct TomlFileSource {
	path: PathBuf,
	required: bool,
}

impl TomlFileSource {
	/// A file that must exist.
	pub fn required(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}

	/// A file that is skipped when absent.
	pub fn optional(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: false,
		}
	}
}

impl SettingsSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SettingsError> {
		let path = self.path.display().to_string();
		if !self.path.is_file() {
			if self.required {
				return Err(SettingsError::Missing(path));
			}
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path).map_err(|source| SettingsError::Io {
			path: path.clone(),
			source,
		})?;
		let table: toml::Table =
			toml::from_str(&content).map_err(|source| SettingsError::Toml { path, source })?;

		table
			.into_iter()
			.map(|(key, value)| {
				serde_json::to_value(value)
					.map(|json| (key, json))
					.map_err(|e| SettingsError::Invalid(e.to_string()))
			})
			.collect()
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// `MIGRATE_*` environment variables.
///
/// Only known keys are picked up; other variables sharing the prefix are
/// ignored.
pub struct EnvSource {
	prefix: String,
}

impl EnvSource {
	/// Create a new environment source reading `prefix`-ed variables
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new(ENV_PREFIX)
	}
}

impl SettingsSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SettingsError> {
		let mut settings = IndexMap::new();

		for (key, value) in std::env::vars() {
			let Some(name) = key.strip_prefix(&self.prefix) else {
				continue;
			};
			let name = name.to_lowercase();

			if BOOLEAN_KEYS.contains(&name.as_str()) {
				settings.insert(name, parse_bool(&value));
			} else if STRING_KEYS.contains(&name.as_str()) {
				settings.insert(name, Value::String(value));
			}
		}

		Ok(settings)
	}

	fn priority(&self) -> u8 {
		80
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

/// Values given explicitly on the command line.
///
/// Boolean flags only take part when set, so a flag left off does not
/// override `true` from a lower-priority source.
pub struct FlagSource<'a> {
	cli: &'a Cli,
}

impl<'a> FlagSource<'a> {
	/// Wraps parsed command-line arguments.
	pub fn new(cli: &'a Cli) -> Self {
		Self { cli }
	}
}

impl SettingsSource for FlagSource<'_> {
	fn load(&self) -> Result<IndexMap<String, Value>, SettingsError> {
		let mut settings = IndexMap::new();

		if let Some(url) = &self.cli.legacy_db_url {
			settings.insert("legacy_db_url".to_string(), Value::String(url.clone()));
		}
		if let Some(uri) = &self.cli.uri {
			settings.insert("uri".to_string(), Value::String(uri.clone()));
		}
		for (key, set) in [
			("halt_on_failure", self.cli.halt_on_failure),
			("simulate", self.cli.simulate),
			("backend", self.cli.backend),
		] {
			if set {
				settings.insert(key.to_string(), Value::Bool(true));
			}
		}

		Ok(settings)
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		"Command-line flags".to_string()
	}
}

fn parse_bool(value: &str) -> Value {
	match value.trim().to_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Value::Bool(true),
		"false" | "0" | "no" | "off" | "" => Value::Bool(false),
		_ => Value::String(value.to_string()),
	}
}

impl MigrateSettings {
	/// Merges `sources` by priority into settings.
	pub fn from_sources(sources: &[&dyn SettingsSource]) -> Result<Self, SettingsError> {
		let mut ordered: Vec<&dyn SettingsSource> = sources.to_vec();
		ordered.sort_by_key(|source| source.priority());

		let mut merged = serde_json::Map::new();
		for source in ordered {
			let values = source.load()?;
			tracing::debug!(source = %source.description(), keys = values.len(), "Loaded settings");
			merged.extend(values);
		}

		serde_json::from_value(Value::Object(merged))
			.map_err(|e| SettingsError::Invalid(e.to_string()))
	}

	/// Loads settings for `cli` from the standard sources.
	///
	/// The settings file is `--settings` when given (it must exist), else
	/// `migrate.toml` below `--root` (or the working directory) when present.
	pub fn load(cli: &Cli) -> Result<Self, SettingsError> {
		let file = match &cli.settings {
			Some(path) => TomlFileSource::required(path),
			None => TomlFileSource::optional(
				cli.root
					.clone()
					.unwrap_or_default()
					.join(DEFAULT_SETTINGS_FILE),
			),
		};
		let env = EnvSource::default();
		let flags = FlagSource::new(cli);

		let sources: [&dyn SettingsSource; 3] = [&file, &env, &flags];
		Self::from_sources(&sources)
	}
}
