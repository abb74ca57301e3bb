//! Error types for infraprobe.
//!
//! Uses `thiserror` for ergonomic error definitions. Each concern gets its
//! own enum; `CliError` gathers them at the command layer.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid probe input.
///
/// Probing itself never fails: every network outcome is classified into a
/// `ProbeResult`. Only constructing a target can be rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("invalid host: {0}")]
    InvalidHost(String),

    #[error("invalid port '{0}': expected a number between 1 and 65535")]
    InvalidPort(String),

    #[error("timeout must be greater than zero")]
    InvalidTimeout,
}

/// CIDR parsing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CidrError {
    #[error("invalid address or CIDR block: {0}")]
    InvalidNetwork(String),
}

/// Errors from driving the provisioning tool.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("failed to start '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("output '{0}' is empty")]
    EmptyOutput(String),

    #[error("output '{key}' is not valid JSON: {reason}")]
    InvalidOutput { key: String, reason: String },

    #[error("working directory not found: {0}")]
    MissingDirectory(PathBuf),
}

/// Errors from querying cloud provider state.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("failed to start '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("no instance found with address {ip} in {region}")]
    InstanceNotFound { ip: String, region: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("invalid suite: {0}")]
    InvalidSuite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Run history storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error("ambiguous run prefix '{prefix}': {matches} matches")]
    AmbiguousPrefix { prefix: String, matches: usize },

    #[error("failed to save run: {0}")]
    SaveFailed(String),

    #[error("failed to load run: {0}")]
    LoadFailed(String),

    #[error("storage directory error: {0}")]
    DirectoryError(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors surfaced by CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Cidr(#[from] CidrError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{0} check(s) failed")]
    ChecksFailed(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Result type alias for cloud queries.
pub type CloudResult<T> = Result<T, CloudError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
