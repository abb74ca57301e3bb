//! Verification suite files.
//!
//! A suite names the module to deploy and what to verify about it. The
//! defaults describe a two-tier VPC: an HTTP instance in one subnet, a
//! database instance in another, and a database port that must not be
//! reachable from where the suite runs.

use crate::error::{ConfigError, ConfigResult};
use crate::network::{cidr_contains, parse_network};
use crate::probe::Expectation;
use crate::provision::TerraformOptions;
use crate::types::Port;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One instance created by the module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceSpec {
    /// Short name used in reports and exposure rules.
    pub name: String,
    /// Module output holding the instance's IP address.
    pub output: String,
    /// Subnet the instance must be placed in.
    pub subnet: String,
}

/// A port whose reachability is asserted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExposureRule {
    /// Name of the instance to probe.
    pub instance: String,
    /// Port as a numeric string.
    pub port: String,
    /// Probe timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// What the probe should observe.
    #[serde(default = "default_expect")]
    pub expect: Expectation,
}

impl ExposureRule {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_expect() -> Expectation {
    Expectation::Blocked
}

/// Everything one suite run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Module directory, relative to the suite file.
    pub terraform_dir: PathBuf,
    /// `terraform` or `terragrunt`.
    pub binary: String,
    /// Input variables for apply and destroy.
    pub vars: BTreeMap<String, String>,
    /// Extra environment for the provisioning tool, e.g. `AWS_PROFILE`.
    pub env: BTreeMap<String, String>,
    /// Region the instances live in.
    pub region: String,
    /// Block every instance must sit in.
    pub vpc_cidr: String,
    pub instances: Vec<InstanceSpec>,
    pub exposure: Vec<ExposureRule>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            terraform_dir: PathBuf::from("../terragrunt/infra-module"),
            binary: "terragrunt".to_string(),
            vars: BTreeMap::new(),
            env: BTreeMap::new(),
            region: "eu-north-1".to_string(),
            vpc_cidr: "192.168.0.0/16".to_string(),
            instances: vec![
                InstanceSpec {
                    name: "http".to_string(),
                    output: "http_ip".to_string(),
                    subnet: "192.168.1.0/24".to_string(),
                },
                InstanceSpec {
                    name: "db".to_string(),
                    output: "db_ip".to_string(),
                    subnet: "192.168.2.0/24".to_string(),
                },
            ],
            exposure: vec![ExposureRule {
                instance: "db".to_string(),
                port: "5432".to_string(),
                timeout_ms: default_timeout_ms(),
                expect: Expectation::Blocked,
            }],
        }
    }
}

impl SuiteConfig {
    /// Load and validate a suite file.
    ///
    /// A relative `terraform_dir` is resolved against the file's directory.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut suite: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        if suite.terraform_dir.is_relative() {
            if let Some(parent) = path.parent() {
                suite.terraform_dir = parent.join(&suite.terraform_dir);
            }
        }

        suite.validate()?;
        Ok(suite)
    }

    /// Check the suite is self-consistent before anything gets deployed.
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |msg: String| Err(ConfigError::InvalidSuite(msg));

        if self.instances.is_empty() {
            return invalid("at least one instance is required".to_string());
        }
        if self.region.trim().is_empty() {
            return invalid("region must not be empty".to_string());
        }
        if parse_network(&self.vpc_cidr).is_err() {
            return invalid(format!("invalid VPC CIDR '{}'", self.vpc_cidr));
        }

        let mut names = HashSet::new();
        for instance in &self.instances {
            if instance.name.trim().is_empty() || instance.output.trim().is_empty() {
                return invalid("instance name and output must not be empty".to_string());
            }
            if !names.insert(instance.name.as_str()) {
                return invalid(format!("duplicate instance name '{}'", instance.name));
            }
            match cidr_contains(&instance.subnet, &self.vpc_cidr) {
                Ok(true) => {}
                Ok(false) => {
                    return invalid(format!(
                        "subnet {} of '{}' is outside VPC {}",
                        instance.subnet, instance.name, self.vpc_cidr
                    ))
                }
                Err(e) => return invalid(format!("instance '{}': {}", instance.name, e)),
            }
        }

        for rule in &self.exposure {
            if !names.contains(rule.instance.as_str()) {
                return invalid(format!(
                    "exposure rule names unknown instance '{}'",
                    rule.instance
                ));
            }
            if let Err(e) = rule.port.parse::<Port>() {
                return invalid(format!("exposure rule for '{}': {}", rule.instance, e));
            }
            if rule.timeout_ms == 0 {
                return invalid(format!(
                    "exposure rule for '{}': timeout must be greater than zero",
                    rule.instance
                ));
            }
        }

        Ok(())
    }

    /// Provisioning options for this suite's module.
    pub fn terraform_options(&self) -> TerraformOptions {
        let mut options =
            TerraformOptions::new(self.terraform_dir.clone()).with_binary(self.binary.clone());
        options.vars = self.vars.clone();
        self.env
            .iter()
            .fold(options, |options, (k, v)| options.with_env(k.clone(), v.clone()))
    }
}
