//! Manifest entry definitions.
//!
//! This module defines the data structures a manifest file is parsed into.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One migration named by a manifest, with its configuration overrides.
///
/// # Example
///
/// ```yaml
/// - d6_file:
///     source:
///       conf_path: sites/assets
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
	id: String,
	overrides: Value,
}

impl ManifestEntry {
	/// Creates an entry without overrides.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			overrides: Value::Object(Map::new()),
		}
	}

	/// Creates an entry with an overrides mapping.
	pub fn with_overrides(id: impl Into<String>, overrides: Map<String, Value>) -> Self {
		Self {
			id: id.into(),
			overrides: Value::Object(overrides),
		}
	}

	/// Returns the migration identifier.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Returns the overrides mapping (always a JSON object).
	pub fn overrides(&self) -> &Value {
		&self.overrides
	}

	/// Returns true if the entry carries at least one override.
	pub fn has_overrides(&self) -> bool {
		self.overrides.as_object().is_some_and(|map| !map.is_empty())
	}
}

/// Shape of a single manifest item before normalization.
///
/// Either a bare id (`- d6_action_settings`) or a mapping from the id to its
/// overrides (`- d6_file: {...}`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawEntry {
	Bare(String),
	WithOverrides(serde_yaml::Mapping),
}

/// Parsed manifest containing entries in execution order.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
	/// Entries in manifest order.
	pub entries: Vec<ManifestEntry>,

	/// Optional source file path.
	pub source: Option<String>,
}

impl Manifest {
	/// Creates a manifest from entries.
	pub fn from_entries(entries: Vec<ManifestEntry>) -> Self {
		Self {
			entries,
			source: None,
		}
	}

	/// Sets the source file path.
	pub fn with_source(mut self, source: impl Into<String>) -> Self {
		self.source = Some(source.into());
		self
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if there are no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns an iterator over the entries.
	pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
		self.entries.iter()
	}

	/// Returns the migration identifiers in manifest order.
	pub fn ids(&self) -> Vec<&str> {
		self.entries.iter().map(ManifestEntry::id).collect()
	}
}

impl IntoIterator for Manifest {
	type Item = ManifestEntry;
	type IntoIter = std::vec::IntoIter<ManifestEntry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.into_iter()
	}
}

impl<'a> IntoIterator for &'a Manifest {
	type Item = &'a ManifestEntry;
	type IntoIter = std::slice::Iter<'a, ManifestEntry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}
