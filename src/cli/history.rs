//! History subcommand implementation.

use crate::error::CliResult;
use crate::output;
use crate::storage::RunStore;
use clap::Parser;

/// View and manage run history.
#[derive(Parser, Debug)]
pub struct HistoryCommand {
    /// Number of recent runs to show
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    /// Clear all run history
    #[arg(long, conflicts_with = "prune")]
    pub clear: bool,

    /// Delete runs older than N days
    #[arg(long, value_name = "DAYS")]
    pub prune: Option<u32>,
}

impl HistoryCommand {
    /// Execute the history command.
    pub fn execute(&self, quiet: bool) -> CliResult<()> {
        let store = RunStore::new()?;

        if self.clear {
            let removed = store.clear()?;
            if !quiet {
                output::print_success(&format!("Removed {} run(s)", removed));
            }
            return Ok(());
        }

        if let Some(days) = self.prune {
            let removed = store.prune(chrono::Duration::days(i64::from(days)))?;
            if !quiet {
                output::print_success(&format!(
                    "Removed {} run(s) older than {} day(s)",
                    removed, days
                ));
            }
            return Ok(());
        }

        output::print_history(&store.list_recent(self.count)?);
        Ok(())
    }
}
