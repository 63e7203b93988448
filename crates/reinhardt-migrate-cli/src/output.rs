//! Output formatting utilities

use std::io::{self, Write};

use colored::Colorize;
use reinhardt_migrate::report::{BackendPayload, summarize};
use reinhardt_migrate::{ExecutionResult, ExecutionStatus, MigrateError, MigrationRun};

/// Print a success message
pub(crate) fn success(out: &mut dyn Write, msg: &str) -> io::Result<()> {
	writeln!(out, "{} {}", "✓".green().bold(), msg)
}

/// Print an error message
pub(crate) fn error(out: &mut dyn Write, msg: &str) -> io::Result<()> {
	writeln!(out, "{} {}", "✗".red().bold(), msg)
}

/// Print a warning message
pub(crate) fn warning(out: &mut dyn Write, msg: &str) -> io::Result<()> {
	writeln!(out, "{} {}", "⚠".yellow().bold(), msg)
}

/// Print an info message
pub(crate) fn info(out: &mut dyn Write, msg: &str) -> io::Result<()> {
	writeln!(out, "{} {}", "ℹ".blue().bold(), msg)
}

/// Print one line per migration, followed by its messages.
pub(crate) fn print_result(out: &mut dyn Write, result: &ExecutionResult) -> io::Result<()> {
	match result.status() {
		ExecutionStatus::Imported => writeln!(
			out,
			"{} {} imported ({} processed)",
			"✓".green().bold(),
			result.id().cyan(),
			result.processed()
		)?,
		ExecutionStatus::Skipped => {
			writeln!(out, "{} {} skipped", "•".yellow().bold(), result.id().cyan())?
		}
		ExecutionStatus::Failed => writeln!(
			out,
			"{} {} failed: {}",
			"✗".red().bold(),
			result.id().cyan(),
			result.error().unwrap_or("unknown error").red()
		)?,
	}

	// The first message repeats the "Importing" line
	for message in result.messages().iter().skip(1) {
		writeln!(out, "    {}", message.dimmed())?;
	}
	Ok(())
}

/// Print a finished run for humans.
///
/// Results and the summary go to `out`; unresolved ids and run-level
/// problems go to `err`.
pub(crate) fn print_run(
	out: &mut dyn Write,
	err: &mut dyn Write,
	run: &MigrationRun,
) -> io::Result<()> {
	if let Some(unresolved) = run.unresolved_error() {
		error(err, &unresolved.to_string())?;
		return Ok(());
	}

	for result in run.results() {
		print_result(out, result)?;
	}

	let summary = summarize(run);
	if run.interrupted() || run.halted() {
		warning(err, &summary)
	} else if run.count(ExecutionStatus::Failed) > 0 {
		warning(out, &summary)
	} else {
		success(out, &summary)
	}
}

/// Print a fatal error, as a payload when `backend` is set.
pub(crate) fn print_fatal(
	out: &mut dyn Write,
	err: &mut dyn Write,
	failure: &MigrateError,
	backend: bool,
) -> anyhow::Result<()> {
	if backend {
		print_payload(out, &BackendPayload::from_error(failure))
	} else {
		error(err, &failure.to_string())?;
		Ok(())
	}
}

/// Print a marked backend payload on its own line.
pub(crate) fn print_payload(out: &mut dyn Write, payload: &BackendPayload) -> anyhow::Result<()> {
	writeln!(out, "{}", payload.render()?)?;
	Ok(())
}
