//! Manifest parsing functionality.
//!
//! Structural validity is checked here; whether the named migrations exist
//! is left to the dispatcher so the two failures stay distinguishable.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use serde_yaml::Value as YamlValue;

use super::entry::RawEntry;
use super::{Manifest, ManifestEntry};
use crate::error::{MigrateError, MigrateResult};

/// Parser for manifest files.
#[derive(Debug, Default)]
pub struct ManifestParser;

impl ManifestParser {
	/// Creates a new manifest parser.
	pub fn new() -> Self {
		Self
	}

	/// Parses a manifest file from the given path.
	///
	/// # Errors
	///
	/// Returns an error if:
	/// - The path does not point to a readable file (`ManifestNotFound`)
	/// - The content is not a sequence of migration entries (`ManifestMalformed`)
	pub fn parse_file(&self, path: &Path) -> MigrateResult<Manifest> {
		if path.is_dir() {
			return Err(MigrateError::ManifestNotFound(path.display().to_string()));
		}

		let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
			std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
				MigrateError::ManifestNotFound(path.display().to_string())
			}
			_ => MigrateError::Io(e),
		})?;

		let manifest = self.parse_str(&content)?;
		Ok(manifest.with_source(path.display().to_string()))
	}

	/// Parses manifest content from a string.
	pub fn parse_str(&self, content: &str) -> MigrateResult<Manifest> {
		let document: YamlValue = serde_yaml::from_str(content).map_err(|e| {
			let location = e
				.location()
				.map(|loc| format!("line {}, column {}", loc.line(), loc.column()))
				.unwrap_or_else(|| "document".to_string());
			MigrateError::malformed(location, e.to_string())
		})?;

		let items = match document {
			YamlValue::Sequence(items) => items,
			YamlValue::Null => {
				return Err(MigrateError::malformed(
					"document",
					"the manifest is empty; expected a sequence of migrations",
				));
			}
			YamlValue::Mapping(_) => {
				return Err(MigrateError::malformed(
					"document",
					"expected a sequence of migrations, found a mapping",
				));
			}
			other => {
				return Err(MigrateError::malformed(
					"document",
					format!(
						"expected a sequence of migrations, found {}",
						describe(&other)
					),
				));
			}
		};

		let mut entries = Vec::with_capacity(items.len());
		let mut seen: HashMap<String, usize> = HashMap::new();
		for (idx, item) in items.into_iter().enumerate() {
			let position = idx + 1;
			let entry = self.parse_entry(item, position)?;
			if let Some(first) = seen.insert(entry.id().to_string(), position) {
				tracing::warn!(
					migration = entry.id(),
					first,
					position,
					"Migration is listed more than once and will run again"
				);
			}
			entries.push(entry);
		}

		Ok(Manifest::from_entries(entries))
	}

	/// Normalizes one sequence item into a [`ManifestEntry`].
	///
	/// A mapping item takes one of two layouts:
	///
	/// ```yaml
	/// # nested: the id maps to its overrides
	/// - d6_file:
	///     source:
	///       conf_path: sites/assets
	///
	/// # flat: the first key is the id, the following keys are overrides
	/// - d6_file:
	///   source:
	///     conf_path: sites/assets
	/// ```
	fn parse_entry(&self, item: YamlValue, position: usize) -> MigrateResult<ManifestEntry> {
		let location = || format!("entry {}", position);
		let found = describe(&item);

		let raw: RawEntry = serde_yaml::from_value(item).map_err(|_| {
			MigrateError::malformed(
				location(),
				format!("expected a migration id or a mapping, found {}", found),
			)
		})?;

		let mapping = match raw {
			RawEntry::Bare(id) => return Ok(ManifestEntry::new(validate_id(&id, position)?)),
			RawEntry::WithOverrides(mapping) => mapping,
		};

		let mut pairs = mapping.into_iter();
		let Some((key, value)) = pairs.next() else {
			return Err(MigrateError::malformed(location(), "missing migration id"));
		};
		let YamlValue::String(id) = key else {
			return Err(MigrateError::malformed(
				location(),
				format!("migration id must be a string, found {}", describe(&key)),
			));
		};
		let id = validate_id(&id, position)?;
		let siblings: serde_yaml::Mapping = pairs.collect();

		let overrides = match value {
			YamlValue::Null => siblings,
			YamlValue::Mapping(nested) if siblings.is_empty() => nested,
			YamlValue::Mapping(_) => {
				return Err(MigrateError::malformed(
					location(),
					format!(
						"overrides for '{}' are given both nested and as {} sibling key(s)",
						id,
						siblings.len()
					),
				));
			}
			other => {
				return Err(MigrateError::malformed(
					location(),
					format!(
						"overrides for '{}' must be a mapping, found {}",
						id,
						describe(&other)
					),
				));
			}
		};

		let overrides = match serde_json::to_value(&overrides) {
			Ok(Value::Object(map)) => map,
			Ok(_) => Map::new(),
			Err(e) => {
				return Err(MigrateError::malformed(
					location(),
					format!("overrides for '{}' cannot be represented: {}", id, e),
				));
			}
		};
		Ok(ManifestEntry::with_overrides(id, overrides))
	}
}

/// Trims surrounding whitespace; registry ids are stored trimmed too.
fn validate_id(id: &str, position: usize) -> MigrateResult<String> {
	let trimmed = id.trim();
	if trimmed.is_empty() {
		return Err(MigrateError::malformed(
			format!("entry {}", position),
			"migration id must not be empty",
		));
	}
	Ok(trimmed.to_string())
}

fn describe(value: &YamlValue) -> String {
	match value {
		YamlValue::Null => "null".to_string(),
		YamlValue::Bool(_) => "a boolean".to_string(),
		YamlValue::Number(_) => "a number".to_string(),
		YamlValue::String(s) => format!("the scalar '{}'", s),
		YamlValue::Sequence(_) => "a sequence".to_string(),
		YamlValue::Mapping(_) => "a mapping".to_string(),
		YamlValue::Tagged(tagged) => format!("a value tagged {}", tagged.tag),
	}
}
