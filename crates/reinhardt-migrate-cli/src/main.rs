//! migrate-manifest binary.
//!
//! Migrations are discovered from `inventory` submissions linked into the
//! binary.

use std::io;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use colored::Colorize;
use reinhardt_migrate::MigrationRegistry;
use reinhardt_migrate_cli::{Cli, Console, EXIT_FAILURE, run};
use tracing_subscriber::EnvFilter;

fn main() {
	let cli = Cli::parse();

	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
		)
		.with_writer(io::stderr)
		.init();

	let interrupt = Arc::new(AtomicBool::new(false));
	let flag = Arc::clone(&interrupt);
	if let Err(e) = ctrlc::set_handler(move || {
		flag.store(true, Ordering::SeqCst);
	}) {
		tracing::warn!("Failed to install Ctrl-C handler: {}", e);
	}

	let code = match MigrationRegistry::from_inventory() {
		Ok(registry) => {
			let stdin = io::stdin();
			let mut input = stdin.lock();
			let mut out = io::stdout();
			let mut err = io::stderr();
			let mut console = Console {
				input: &mut input,
				out: &mut out,
				err: &mut err,
			};
			run(&cli, registry, interrupt, &mut console).unwrap_or_else(|e| {
				eprintln!("{} {:#}", "✗".red().bold(), e);
				EXIT_FAILURE
			})
		}
		Err(e) => {
			eprintln!("{} {}", "✗".red().bold(), e);
			EXIT_FAILURE
		}
	};

	process::exit(code);
}
