//! Migration registry.
//!
//! The registry is an immutable lookup table from migration identifier to
//! [`MigrationDefinition`]. It is built once by the host and passed to the
//! dispatcher explicitly, so tests can substitute a registry of fakes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::migration::MigrationDefinition;

/// Registration record for link-time discovery.
///
/// Host crates submit their definitions with `inventory`:
///
/// ```ignore
/// inventory::submit! {
///     MigrationRegistration::new(|| Box::new(ActionSettings))
/// }
/// ```
pub struct MigrationRegistration {
	constructor: fn() -> Box<dyn MigrationDefinition>,
}

impl MigrationRegistration {
	/// Creates a registration from a definition constructor.
	pub const fn new(constructor: fn() -> Box<dyn MigrationDefinition>) -> Self {
		Self { constructor }
	}
}

inventory::collect!(MigrationRegistration);

/// Immutable mapping from migration identifier to definition.
#[derive(Clone, Default)]
pub struct MigrationRegistry {
	definitions: Arc<HashMap<String, Arc<dyn MigrationDefinition>>>,
}

impl MigrationRegistry {
	/// Starts building a registry.
	pub fn builder() -> MigrationRegistryBuilder {
		MigrationRegistryBuilder::default()
	}

	/// Creates an empty registry.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Builds a registry from every definition submitted with `inventory`.
	///
	/// # Errors
	///
	/// Returns an error if two submissions share an identifier.
	pub fn from_inventory() -> Result<Self, RegistryError> {
		let mut builder = Self::builder();
		for registration in inventory::iter::<MigrationRegistration> {
			builder = builder.register_boxed((registration.constructor)())?;
		}
		Ok(builder.build())
	}

	/// Gets the definition for the specified identifier.
	pub fn lookup(&self, id: &str) -> Option<Arc<dyn MigrationDefinition>> {
		self.definitions.get(id).cloned()
	}

	/// Checks if a definition is registered for the identifier.
	pub fn contains(&self, id: &str) -> bool {
		self.definitions.contains_key(id)
	}

	/// Returns all registered identifiers, sorted.
	pub fn ids(&self) -> Vec<String> {
		let mut ids: Vec<String> = self.definitions.keys().cloned().collect();
		ids.sort();
		ids
	}

	/// Returns the number of registered definitions.
	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	/// Returns true if no definitions are registered.
	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

impl fmt::Debug for MigrationRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MigrationRegistry")
			.field("ids", &self.ids())
			.finish()
	}
}

/// Builder collecting definitions before the registry is frozen.
#[derive(Default)]
pub struct MigrationRegistryBuilder {
	definitions: HashMap<String, Arc<dyn MigrationDefinition>>,
}

impl MigrationRegistryBuilder {
	/// Registers a definition.
	///
	/// # Errors
	///
	/// Returns an error if the identifier is empty, has surrounding whitespace
	/// or is already registered.
	pub fn register<D: MigrationDefinition + 'static>(
		self,
		definition: D,
	) -> Result<Self, RegistryError> {
		self.insert(Arc::new(definition))
	}

	/// Registers an already boxed definition.
	pub fn register_boxed(
		self,
		definition: Box<dyn MigrationDefinition>,
	) -> Result<Self, RegistryError> {
		self.insert(Arc::from(definition))
	}

	fn insert(mut self, definition: Arc<dyn MigrationDefinition>) -> Result<Self, RegistryError> {
		let id = definition.id().to_string();
		if id.trim().is_empty() {
			return Err(RegistryError::EmptyIdentifier);
		}
		if id.trim() != id {
			return Err(RegistryError::UntrimmedIdentifier(id));
		}
		if self.definitions.contains_key(&id) {
			return Err(RegistryError::DuplicateMigration(id));
		}
		self.definitions.insert(id, definition);
		Ok(self)
	}

	/// Freezes the registry.
	pub fn build(self) -> MigrationRegistry {
		MigrationRegistry {
			definitions: Arc::new(self.definitions),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::MigrationError;
	use crate::migration::{ImportOutcome, Migration, MigrationContext};
	use rstest::rstest;
	use serde_json::{Value, json};

	struct TestDefinition {
		id: String,
	}

	impl TestDefinition {
		fn new(id: &str) -> Self {
			Self { id: id.to_string() }
		}
	}

	struct Noop;

	impl Migration for Noop {
		fn import(
			&mut self,
			_ctx: &mut MigrationContext<'_>,
		) -> Result<ImportOutcome, MigrationError> {
			Ok(ImportOutcome::imported(0))
		}
	}

	impl MigrationDefinition for TestDefinition {
		fn id(&self) -> &str {
			&self.id
		}

		fn default_configuration(&self) -> Value {
			json!({})
		}

		fn instantiate(&self, _configuration: Value) -> Result<Box<dyn Migration>, MigrationError> {
			Ok(Box::new(Noop))
		}
	}

	#[rstest]
	fn test_register_and_lookup() {
		let registry = MigrationRegistry::builder()
			.register(TestDefinition::new("d6_file"))
			.unwrap()
			.build();

		assert!(registry.contains("d6_file"));
		assert!(!registry.contains("d6_user"));
		assert_eq!(registry.lookup("d6_file").unwrap().id(), "d6_file");
		assert!(registry.lookup("d6_user").is_none());
	}

	#[rstest]
	fn test_duplicate_registration_is_rejected() {
		let result = MigrationRegistry::builder()
			.register(TestDefinition::new("d6_file"))
			.unwrap()
			.register(TestDefinition::new("d6_file"));

		assert_eq!(
			result.err(),
			Some(RegistryError::DuplicateMigration("d6_file".to_string()))
		);
	}

	#[rstest]
	fn test_empty_identifier_is_rejected() {
		let result = MigrationRegistry::builder().register(TestDefinition::new("  "));
		assert_eq!(result.err(), Some(RegistryError::EmptyIdentifier));
	}

	#[rstest]
	#[case(" d6_file")]
	#[case("d6_file\n")]
	fn test_untrimmed_identifier_is_rejected(#[case] id: &str) {
		let result = MigrationRegistry::builder().register(TestDefinition::new(id));
		assert_eq!(
			result.err(),
			Some(RegistryError::UntrimmedIdentifier(id.to_string()))
		);
	}

	#[rstest]
	fn test_ids_are_sorted() {
		let registry = MigrationRegistry::builder()
			.register(TestDefinition::new("d6_user"))
			.unwrap()
			.register(TestDefinition::new("d6_action_settings"))
			.unwrap()
			.register_boxed(Box::new(TestDefinition::new("d6_file")))
			.unwrap()
			.build();

		assert_eq!(registry.len(), 3);
		assert_eq!(
			registry.ids(),
			vec!["d6_action_settings", "d6_file", "d6_user"]
		);
	}

	#[rstest]
	fn test_empty_registry() {
		let registry = MigrationRegistry::empty();
		assert!(registry.is_empty());
		assert!(registry.lookup("anything").is_none());
	}

	#[rstest]
	fn test_from_inventory_without_submissions() {
		let registry = MigrationRegistry::from_inventory().unwrap();
		assert!(registry.is_empty());
	}
}
