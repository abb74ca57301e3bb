//! Run subcommand implementation.
//!
//! Handles `infraprobe run [suite]`: apply the module once, run every check,
//! destroy it, and record the outcome.

use crate::cli::OutputFormat;
use crate::cloud::AwsCli;
use crate::config::{AppSettings, SuiteConfig};
use crate::error::{CliError, CliResult};
use crate::output;
use crate::provision::{Teardown, Terraform};
use crate::storage::{RunRecord, RunStore};
use crate::suite::{self, SuiteReport};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Deploy a module, run every check, and destroy it.
#[derive(Parser, Debug)]
pub struct RunCommand {
    /// Suite file (JSON); the built-in http/db suite is used when omitted
    #[arg(value_name = "SUITE_FILE")]
    pub suite: Option<PathBuf>,

    /// Module directory, overriding the suite's
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Provisioning binary (terraform or terragrunt)
    #[arg(short, long)]
    pub binary: Option<String>,

    /// Region the instances are looked up in
    #[arg(short, long)]
    pub region: Option<String>,

    /// Leave the infrastructure running after the checks
    #[arg(long)]
    pub keep: bool,

    /// Don't save the run to history
    #[arg(long)]
    pub no_save: bool,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,
}

impl RunCommand {
    /// Build the suite from the file, settings and flags, in increasing precedence.
    pub fn suite(&self, settings: &AppSettings) -> CliResult<SuiteConfig> {
        let mut suite = match &self.suite {
            Some(path) => SuiteConfig::load_from(path)?,
            None => SuiteConfig {
                binary: settings.provision_binary.clone(),
                region: settings.default_region.clone(),
                ..SuiteConfig::default()
            },
        };

        if let Some(dir) = &self.dir {
            suite.terraform_dir = dir.clone();
        }
        if let Some(binary) = &self.binary {
            suite.binary = binary.clone();
        }
        if let Some(region) = &self.region {
            suite.region = region.clone();
        }

        suite.validate()?;
        Ok(suite)
    }

    /// Execute the run command.
    pub async fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let suite = self.suite(settings)?;
        let dir = suite.terraform_dir.display().to_string();
        let interactive = !quiet && self.output == OutputFormat::Plain;

        if interactive {
            output::print_run_header(&dir, &suite.binary, &suite.region);
        }

        let provisioner = Terraform::new(suite.terraform_options());
        let lookup = match &settings.aws_profile {
            Some(profile) => AwsCli::new(settings.aws_binary.clone()).with_profile(profile.clone()),
            None => AwsCli::new(settings.aws_binary.clone()),
        };
        let teardown = if self.keep {
            Teardown::Keep
        } else {
            Teardown::Destroy
        };

        let spinner = if interactive {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) =
                ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
            {
                pb.set_style(style);
            }
            pb.set_message(format!("deploying and checking {}", dir));
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        let record = RunRecord::new(dir.clone(), suite.region.clone());
        let deployment = suite::run_suite(&suite, &provisioner, &lookup, teardown).await;

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let (report, provision_error) = match deployment.result {
            Ok(report) => (report, None),
            Err(e) => (SuiteReport::default(), Some(e)),
        };
        let teardown_error = deployment.teardown.err();

        let record = record.finish(
            report,
            provision_error.as_ref().map(ToString::to_string),
            teardown_error.as_ref().map(ToString::to_string),
        );
        info!(run_id = %record.id, passed = record.passed(), "run finished");

        if settings.auto_save_runs && !self.no_save {
            let store = RunStore::new()?;
            store.save(&record)?;

            if interactive {
                output::print_info(&format!("Run saved as {}", record.id.short()));
            }
        }

        let rendered = output::render_run(&record, self.output)?;
        if rendered.ends_with('\n') {
            print!("{}", rendered);
        } else {
            println!("{}", rendered);
        }

        if let Some(e) = provision_error {
            return Err(e.into());
        }
        if !record.report.all_passed() {
            return Err(CliError::ChecksFailed(record.report.failed_count()));
        }
        if let Some(e) = teardown_error {
            return Err(e.into());
        }

        if interactive {
            output::print_success("All checks passed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn command(args: &[&str]) -> RunCommand {
        let mut argv = vec!["run"];
        argv.extend_from_slice(args);
        RunCommand::parse_from(argv)
    }

    #[test]
    fn test_default_suite_uses_settings() {
        let settings = AppSettings {
            default_region: "us-east-2".to_string(),
            provision_binary: "terraform".to_string(),
            ..AppSettings::default()
        };

        let suite = command(&[]).suite(&settings).unwrap();
        assert_eq!(suite.region, "us-east-2");
        assert_eq!(suite.binary, "terraform");
        assert_eq!(suite.instances.len(), 2);
    }

    #[test]
    fn test_flags_override_suite_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("suite.json");
        fs::write(&path, r#"{"region": "eu-west-1", "terraform_dir": "module"}"#).unwrap();

        let suite = command(&[path.to_str().unwrap(), "--region", "ap-south-1", "-d", "/srv/m"])
            .suite(&AppSettings::default())
            .unwrap();
        assert_eq!(suite.region, "ap-south-1");
        assert_eq!(suite.terraform_dir, PathBuf::from("/srv/m"));
    }

    #[test]
    fn test_empty_region_rejected() {
        let result = command(&["--region", ""]).suite(&AppSettings::default());
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
