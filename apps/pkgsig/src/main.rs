//! pkgsig - RPM package signature checking
//!
//! This is the main CLI application; the work is done by the ops crate.
//! The exit status is the number of failed packages or key import units,
//! capped at 255.

mod cli;
mod display;
mod error;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use clap::Parser;
use pkgsig_config::Config;
use pkgsig_ops::{import_keys, list_keys, verify_packages, OperationResult, OpsContextBuilder};
use pkgsig_types::OutputFormat;
use std::io::{self, Write};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.json, cli.global.debug);

    match run(cli) {
        Ok(failures) => process::exit(exit_code(failures)),
        Err(e) => {
            error!("Application error: {}", e);
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Main application logic, returning the number of failed units
fn run(cli: Cli) -> Result<usize, CliError> {
    info!("Starting pkgsig v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref())?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global, &cli.command);

    let renderer = OutputRenderer::new(config.output.format == OutputFormat::Json);
    let mut ctx = OpsContextBuilder::new().with_config(config).build()?;

    let result = match cli.command {
        Commands::Checksig { packages, .. } => {
            let report = if renderer.is_json() {
                verify_packages(&ctx, packages.as_slice(), &mut io::sink())?
            } else {
                let mut stdout = io::stdout().lock();
                let report = verify_packages(&ctx, packages.as_slice(), &mut stdout)?;
                stdout.flush()?;
                report
            };
            OperationResult::CheckReport(report)
        }
        Commands::Import { sources } => {
            OperationResult::ImportReport(import_keys(&mut ctx, sources.as_slice()))
        }
        Commands::Keys => OperationResult::KeyList(list_keys(&ctx)),
    };

    renderer.render_result(&result)?;

    let failures = result.failures();
    info!(failures, "Command completed");
    Ok(failures)
}

fn exit_code(failures: usize) -> i32 {
    i32::try_from(failures.min(255)).unwrap_or(255)
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs, command: &Commands) {
    // Global CLI flags override everything
    if let Some(dir) = &global.keyring {
        config.keys.keyring_dir = Some(dir.clone());
    }
    if global.verbose {
        config.output.verbose = true;
    }
    if global.print_packets {
        config.output.print_packets = true;
    }
    if global.json {
        config.output.format = OutputFormat::Json;
    }

    // Command-specific CLI flags
    if let Commands::Checksig {
        nodigest,
        nosignature,
        nopayload,
        ..
    } = command
    {
        config.verify.nodigest |= *nodigest;
        config.verify.nosignature |= *nosignature;
        config.verify.nopayload |= *nopayload;
    }
}

/// Initialize tracing; diagnostics always go to stderr
fn init_tracing(json_mode: bool, debug_enabled: bool) {
    let default_filter = if debug_enabled {
        "info,pkgsig=debug,pkgsig_ops=debug,pkgsig_verify=debug,pkgsig_pgp=debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        // JSON mode: keep stdout clean for the result document
        tracing_subscriber::fmt()
            .json()
            .with_writer(io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(filter)
            .with_target(debug_enabled)
            .init();
    }
}
