//! Export subcommand implementation.
//!
//! Handles `infraprobe export <run-id>` for writing a recorded run out again.

use crate::cli::OutputFormat;
use crate::error::CliResult;
use crate::output;
use crate::storage::RunStore;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

/// Export a recorded run.
#[derive(Parser, Debug)]
pub struct ExportCommand {
    /// Run ID or prefix to export
    ///
    /// Can be a full UUID or the first few characters (short ID).
    #[arg(value_name = "RUN_ID")]
    pub run_id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Output file path (prints to stdout if not specified)
    #[arg(short = 'o', long = "output")]
    pub output_file: Option<PathBuf>,

    /// Export only the failed checks
    #[arg(long)]
    pub failed_only: bool,
}

impl ExportCommand {
    /// Execute the export command.
    pub fn execute(&self, quiet: bool) -> CliResult<()> {
        let store = RunStore::new()?;
        let mut record = store.find(&self.run_id)?;

        if self.failed_only {
            record.report.checks.retain(|c| !c.passed);
        }

        let content = output::render_run(&record, self.format)?;

        if let Some(path) = &self.output_file {
            fs::write(path, &content)?;

            if !quiet {
                output::print_success(&format!(
                    "Exported run {} to {}",
                    record.id.short(),
                    path.display()
                ));
            }
        } else {
            println!("{}", content.trim_end());
        }

        Ok(())
    }
}
