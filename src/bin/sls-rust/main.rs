//! sls-rust CLI - Rust function builds for serverless deployments

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use sls_rust::core::DescriptorError;
use sls_rust::util::diagnostic::{self, suggestions, Diagnostic};
use sls_rust::ops::ServiceError;

/// Log filter override, in `EnvFilter` syntax.
const LOG_ENV: &str = "SLS_RUST_LOG";

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    // Set up logging
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("sls_rust=debug")
        } else {
            EnvFilter::new("sls_rust=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(cli, color) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    match cli.command {
        Commands::Build(args) => commands::build::execute(args, color),
        Commands::Hooks(args) => commands::hooks::execute(args),
        Commands::Toolchain => commands::toolchain::execute(),
    }
}

fn report(e: &anyhow::Error, color: bool) {
    if let Some(err) = e.downcast_ref::<ServiceError>() {
        diagnostic::emit(&err.to_diagnostic(), color);
    } else if let Some(err) = e.downcast_ref::<DescriptorError>() {
        let diag = Diagnostic::error(err.to_string()).with_suggestion(suggestions::NO_DESCRIPTOR);
        diagnostic::emit(&diag, color);
    } else {
        eprintln!("error: {:#}", e);
    }
}
