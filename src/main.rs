//! infraprobe command-line entry point.

use clap::Parser;
use infraprobe::cli::Cli;
use infraprobe::error::CliError;
use infraprobe::output;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "infraprobe=debug"
    } else if quiet {
        "infraprobe=warn"
    } else {
        "infraprobe=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.execute().await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(CliError::ChecksFailed(count)) => {
            if !cli.quiet {
                output::print_error(&format!("{} check(s) failed", count));
            }
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}
