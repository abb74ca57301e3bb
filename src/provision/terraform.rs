//! Terraform and Terragrunt command line driver.
//!
//! Both tools accept the same subcommands, so one driver covers them.
//! Terragrunt additionally gets `--terragrunt-non-interactive` so it never
//! stops to ask a question.

use crate::error::{ProvisionError, ProvisionResult};
use crate::provision::Provisioner;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Where the module lives and how to invoke the tool.
#[derive(Debug, Clone)]
pub struct TerraformOptions {
    /// Directory holding the module (the tool's working directory).
    pub dir: PathBuf,
    /// `terraform`, `terragrunt`, or a path to either.
    pub binary: String,
    /// Input variables passed as `-var key=value` to apply and destroy.
    pub vars: BTreeMap<String, String>,
    /// Extra environment variables for every invocation.
    pub env_vars: BTreeMap<String, String>,
    /// Pass `-no-color` to every command.
    pub no_color: bool,
}

impl TerraformOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            binary: "terraform".to_string(),
            vars: BTreeMap::new(),
            env_vars: BTreeMap::new(),
            no_color: true,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Whether the configured binary is Terragrunt.
    pub fn is_terragrunt(&self) -> bool {
        Path::new(&self.binary)
            .file_stem()
            .is_some_and(|stem| stem == "terragrunt")
    }

    fn finish(&self, mut args: Vec<String>) -> Vec<String> {
        if self.no_color {
            args.push("-no-color".to_string());
        }
        if self.is_terragrunt() {
            args.push("--terragrunt-non-interactive".to_string());
        }
        args
    }

    fn var_args(&self) -> impl Iterator<Item = String> + '_ {
        self.vars
            .iter()
            .flat_map(|(k, v)| ["-var".to_string(), format!("{}={}", k, v)])
    }

    pub(crate) fn init_args(&self) -> Vec<String> {
        self.finish(vec![
            "init".to_string(),
            "-upgrade=false".to_string(),
            "-input=false".to_string(),
        ])
    }

    pub(crate) fn apply_args(&self) -> Vec<String> {
        let mut args = vec![
            "apply".to_string(),
            "-input=false".to_string(),
            "-auto-approve".to_string(),
            "-lock=false".to_string(),
        ];
        args.extend(self.var_args());
        self.finish(args)
    }

    pub(crate) fn output_args(&self, key: &str) -> Vec<String> {
        let mut args = self.finish(vec!["output".to_string(), "-json".to_string()]);
        // The output name goes last; Terraform treats it as the positional argument
        args.push(key.to_string());
        args
    }

    pub(crate) fn destroy_args(&self) -> Vec<String> {
        let mut args = vec![
            "destroy".to_string(),
            "-auto-approve".to_string(),
            "-input=false".to_string(),
            "-lock=false".to_string(),
        ];
        args.extend(self.var_args());
        self.finish(args)
    }
}

/// [`Provisioner`] that shells out to Terraform or Terragrunt.
#[derive(Debug, Clone)]
pub struct Terraform {
    options: TerraformOptions,
}

impl Terraform {
    pub fn new(options: TerraformOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TerraformOptions {
        &self.options
    }

    /// Run the tool with `args` and return its stdout.
    async fn run(&self, args: &[String]) -> ProvisionResult<String> {
        if !self.options.dir.is_dir() {
            return Err(ProvisionError::MissingDirectory(self.options.dir.clone()));
        }

        let command = format!("{} {}", self.options.binary, args.join(" "));
        debug!(%command, dir = %self.options.dir.display(), "running");

        let output = Command::new(&self.options.binary)
            .args(args)
            .current_dir(&self.options.dir)
            .envs(&self.options.env_vars)
            .env("TF_IN_AUTOMATION", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ProvisionError::Spawn {
                binary: self.options.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let status = match output.status.code() {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            };
            return Err(ProvisionError::CommandFailed {
                command,
                status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Provisioner for Terraform {
    async fn init_and_apply(&self) -> ProvisionResult<()> {
        info!(dir = %self.options.dir.display(), binary = %self.options.binary, "init");
        self.run(&self.options.init_args()).await?;
        info!(dir = %self.options.dir.display(), "apply");
        self.run(&self.options.apply_args()).await?;
        Ok(())
    }

    async fn output(&self, key: &str) -> ProvisionResult<String> {
        let stdout = self.run(&self.options.output_args(key)).await?;
        parse_output(key, &stdout)
    }

    async fn destroy(&self) -> ProvisionResult<()> {
        info!(dir = %self.options.dir.display(), "destroy");
        self.run(&self.options.destroy_args()).await?;
        Ok(())
    }
}

/// Turn `output -json <key>` text into a plain string.
///
/// Strings lose their quotes; lists, maps, numbers and booleans keep their
/// compact JSON form.
pub(crate) fn parse_output(key: &str, stdout: &str) -> ProvisionResult<String> {
    let value: serde_json::Value =
        serde_json::from_str(stdout.trim()).map_err(|e| ProvisionError::InvalidOutput {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

    let text = match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    };

    if text.trim().is_empty() {
        return Err(ProvisionError::EmptyOutput(key.to_string()));
    }
    Ok(text)
}
