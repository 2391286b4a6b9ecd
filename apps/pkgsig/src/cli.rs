//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pkgsig - RPM package signature checking and trusted key management
#[derive(Parser)]
#[command(name = "pkgsig")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify RPM package digests and signatures")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print one line per checked item
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Dump parsed OpenPGP packets at debug level
    #[arg(long, global = true)]
    pub print_packets: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use alternate keyring directory
    #[arg(long, global = true, value_name = "DIR")]
    pub keyring: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check package digests and signatures
    #[command(alias = "K")]
    Checksig {
        /// Skip digest checks
        #[arg(long)]
        nodigest: bool,

        /// Skip signature checks
        #[arg(long)]
        nosignature: bool,

        /// Skip checks that need the payload
        #[arg(long)]
        nopayload: bool,

        /// Package files to check
        #[arg(required = true)]
        packages: Vec<PathBuf>,
    },

    /// Import armored public keys into the keyring
    Import {
        /// Key files, URLs, `-` for stdin, or 0x<keyid>
        #[arg(required = true)]
        sources: Vec<String>,
    },

    /// List trusted keys
    Keys,
}
