//! Fake legacy migrations for integration tests.
//!
//! Mirrors the shape of real Drupal 6 migrations closely enough to exercise
//! configuration merging, ordering and failure handling.

use std::sync::{Arc, Mutex};

use reinhardt_migrate::{
	ImportOutcome, Migration, MigrationContext, MigrationDefinition, MigrationError,
	MigrationRegistry,
};
use serde_json::{Value, json};

/// Shared record of imports, in the order they happened.
#[derive(Clone, Default)]
pub struct ImportJournal(Arc<Mutex<Vec<String>>>);

impl ImportJournal {
	pub fn imported(&self) -> Vec<String> {
		self.0.lock().unwrap().clone()
	}

	fn record(&self, id: &str) {
		self.0.lock().unwrap().push(id.to_string());
	}
}

/// A migration whose import records itself and echoes its configuration.
pub struct LegacyDefinition {
	id: &'static str,
	defaults: Value,
	fails: bool,
	journal: ImportJournal,
}

impl LegacyDefinition {
	pub fn action_settings(journal: &ImportJournal) -> Self {
		Self {
			id: "d6_action_settings",
			defaults: json!({
				"source": {"plugin": "variable", "variables": ["actions_max_stack"]},
				"destination": {"plugin": "config", "config_name": "action.settings"}
			}),
			fails: false,
			journal: journal.clone(),
		}
	}

	pub fn file(journal: &ImportJournal) -> Self {
		Self {
			id: "d6_file",
			defaults: json!({
				"source": {"plugin": "d6_file", "conf_path": "sites/default"},
				"destination": {
					"plugin": "entity:file",
					"source_base_path": "",
					"destination_path_property": "filepath",
					"urlencode": false
				}
			}),
			fails: false,
			journal: journal.clone(),
		}
	}

	pub fn failing(id: &'static str, journal: &ImportJournal) -> Self {
		Self {
			id,
			defaults: json!({}),
			fails: true,
			journal: journal.clone(),
		}
	}
}

struct LegacyMigration {
	id: &'static str,
	configuration: Value,
	fails: bool,
	journal: ImportJournal,
}

impl Migration for LegacyMigration {
	fn import(&mut self, ctx: &mut MigrationContext<'_>) -> Result<ImportOutcome, MigrationError> {
		self.journal.record(self.id);
		if self.fails {
			return Err(MigrationError::new("source table does not exist"));
		}
		if let Some(path) = self.configuration["source"]["conf_path"].as_str() {
			ctx.log(format!("Reading files below {}", path));
		}
		Ok(ImportOutcome::imported(1))
	}
}

impl MigrationDefinition for LegacyDefinition {
	fn id(&self) -> &str {
		self.id
	}

	fn default_configuration(&self) -> Value {
		self.defaults.clone()
	}

	fn instantiate(&self, configuration: Value) -> Result<Box<dyn Migration>, MigrationError> {
		Ok(Box::new(LegacyMigration {
			id: self.id,
			configuration,
			fails: self.fails,
			journal: self.journal.clone(),
		}))
	}
}

/// Registry holding `d6_action_settings` and `d6_file`.
pub fn d6_registry(journal: &ImportJournal) -> MigrationRegistry {
	MigrationRegistry::builder()
		.register(LegacyDefinition::action_settings(journal))
		.unwrap()
		.register(LegacyDefinition::file(journal))
		.unwrap()
		.build()
}
