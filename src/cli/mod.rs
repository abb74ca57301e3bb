//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `infraprobe probe <host>` - Probe one host:port
//! - `infraprobe run [suite]` - Deploy, verify and destroy a module
//! - `infraprobe cidr <addr> <block>` - Check CIDR containment
//! - `infraprobe history` - View run history
//! - `infraprobe export <run-id>` - Export a recorded run

mod cidr;
mod export;
mod history;
mod probe;
mod run;

pub use cidr::CidrCommand;
pub use export::ExportCommand;
pub use history::HistoryCommand;
pub use probe::ProbeCommand;
pub use run::RunCommand;

use crate::config::AppSettings;
use crate::error::CliResult;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// infraprobe - Integration tests for network-isolated infrastructure.
///
/// Provisions a Terraform or Terragrunt module, checks that its instances
/// run in the expected subnets and that guarded ports time out, then tears
/// everything down again.
#[derive(Parser, Debug)]
#[command(name = "infraprobe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reachability probes and infrastructure test runs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to custom settings file
    #[arg(long, global = true, value_name = "PATH", env = "INFRAPROBE_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Load settings from `--config`, or the default location.
    pub fn settings(&self) -> CliResult<AppSettings> {
        let settings = match &self.config {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::load()?,
        };
        Ok(settings)
    }

    /// Dispatch to the selected subcommand.
    pub async fn execute(&self) -> CliResult<()> {
        match &self.command {
            Commands::Probe(cmd) => cmd.execute(&self.settings()?).await,
            Commands::Run(cmd) => cmd.execute(&self.settings()?, self.quiet).await,
            Commands::Cidr(cmd) => cmd.execute(),
            Commands::History(cmd) => cmd.execute(self.quiet),
            Commands::Export(cmd) => cmd.execute(self.quiet),
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe whether a TCP port answers within a timeout
    #[command(alias = "p")]
    Probe(ProbeCommand),

    /// Deploy a module, run every check, and destroy it
    #[command(alias = "r")]
    Run(RunCommand),

    /// Check whether an address or block lies inside another block
    Cidr(CidrCommand),

    /// View run history
    #[command(alias = "h")]
    History(HistoryCommand),

    /// Export a recorded run
    #[command(alias = "e")]
    Export(ExportCommand),
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}
