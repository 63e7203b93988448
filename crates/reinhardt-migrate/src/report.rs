//! Structured run reports.
//!
//! A [`BackendPayload`] is the machine-parseable form of a run. It is written
//! between start/end markers so callers can pick it out of mixed output.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::redact_sensitive_values;
use crate::dispatcher::{ExecutionResult, ExecutionStatus, MigrationRun};
use crate::error::MigrateError;

/// Marker preceding the JSON payload.
pub const BACKEND_OUTPUT_START: &str = "MIGRATE_BACKEND_OUTPUT_START>>>";

/// Marker following the JSON payload.
pub const BACKEND_OUTPUT_END: &str = "<<<MIGRATE_BACKEND_OUTPUT_END";

/// Per-migration detail inside a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationDetail {
	/// Outcome status.
	pub status: ExecutionStatus,

	/// Lines logged while running the migration.
	#[serde(default)]
	pub messages: Vec<String>,

	/// Merged configuration, with secrets redacted.
	#[serde(default)]
	pub configuration: Value,

	/// Number of processed items.
	#[serde(default)]
	pub processed: u64,

	/// Failure cause, when failed.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl From<&ExecutionResult> for MigrationDetail {
	fn from(result: &ExecutionResult) -> Self {
		Self {
			status: result.status(),
			messages: result.messages().to_vec(),
			configuration: redact_sensitive_values(result.configuration()),
			processed: result.processed(),
			error: result.error().map(str::to_string),
		}
	}
}

/// Machine-parseable report of a `migrate-manifest` invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendPayload {
	/// Migration id to detail, in execution order.
	#[serde(default)]
	pub object: IndexMap<String, MigrationDetail>,

	/// Diagnostic lines.
	#[serde(default)]
	pub log: Vec<String>,

	/// Error lines (unresolved ids, malformed manifest, failures).
	#[serde(default)]
	pub error_log: Vec<String>,

	/// 0 on success, 1 otherwise.
	#[serde(default)]
	pub error_status: u8,
}

impl BackendPayload {
	/// Builds a payload from a finished run.
	pub fn from_run(run: &MigrationRun) -> Self {
		Self {
			object: run
				.results()
				.iter()
				.map(|result| (result.id().to_string(), MigrationDetail::from(result)))
				.collect(),
			log: run.log().to_vec(),
			error_log: run.error_log().to_vec(),
			error_status: u8::from(!run.is_success()),
		}
	}

	/// Builds a payload for an invocation that failed before dispatch.
	pub fn from_error(error: &MigrateError) -> Self {
		Self {
			error_log: vec![error.to_string()],
			error_status: 1,
			..Self::default()
		}
	}

	/// Serializes the payload between the backend markers.
	pub fn render(&self) -> serde_json::Result<String> {
		let json = serde_json::to_string(self)?;
		Ok(format!("{}{}{}", BACKEND_OUTPUT_START, json, BACKEND_OUTPUT_END))
	}
}

/// Extracts a payload from command output.
///
/// Returns `None` if the markers are missing or the JSON between them is invalid.
pub fn parse_backend_output(output: &str) -> Option<BackendPayload> {
	let start = output.find(BACKEND_OUTPUT_START)? + BACKEND_OUTPUT_START.len();
	let end = start + output[start..].find(BACKEND_OUTPUT_END)?;
	serde_json::from_str(&output[start..end]).ok()
}

/// Renders a short human-readable summary of a run.
pub fn summarize(run: &MigrationRun) -> String {
	if !run.unresolved().is_empty() {
		return format!(
			"No migrations were run: {} unknown migration(s)",
			run.unresolved().len()
		);
	}

	let mut summary = format!(
		"{} imported, {} skipped, {} failed",
		run.count(ExecutionStatus::Imported),
		run.count(ExecutionStatus::Skipped),
		run.count(ExecutionStatus::Failed)
	);
	if run.halted() {
		summary.push_str(" (halted after failure)");
	}
	if run.interrupted() {
		summary.push_str(" (interrupted)");
	}
	summary
}
