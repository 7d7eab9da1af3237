//! topo CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure (bad config or unresolved reference)
//! - 5: Engine error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use topo_config::ConfigError;
use topo_core::CoreError;
use topo_engine::{EngineError, OutputError};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const ENGINE_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_directives = if cli.verbose {
        "topo=debug,topo_core=debug,topo_engine=debug,topo_config=debug,warn"
    } else if cli.quiet {
        "error"
    } else {
        "topo=info,topo_core=info,topo_engine=info,topo_config=info,warn"
    };

    // Logging may already be initialized, continue either way
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directives)),
        )
        .try_init();

    let result = match cli.command {
        Commands::Plan(args) => commands::plan::execute(args).await,
        Commands::Validate(args) => commands::validate::execute(args).await,
        Commands::Names(args) => commands::names::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<CoreError>() {
            return match err {
                CoreError::Engine(_) | CoreError::Output(_) => ExitCodes::ENGINE_ERROR,
                _ => ExitCodes::VALIDATION_FAILURE,
            };
        }
        if let Some(err) = cause.downcast_ref::<ConfigError>() {
            return match err {
                ConfigError::NotFound(_) => ExitCodes::INVALID_ARGS,
                _ => ExitCodes::VALIDATION_FAILURE,
            };
        }
        if cause.is::<EngineError>() || cause.is::<OutputError>() {
            return ExitCodes::ENGINE_ERROR;
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("validation") {
        ExitCodes::VALIDATION_FAILURE
    } else if msg.contains("argument") || msg.contains("option") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
