//! Instance state through the AWS command line tool.
//!
//! Runs `aws ec2 describe-instances` filtered by address and reads the
//! state name out of the JSON response. Credentials and profiles are
//! whatever the `aws` tool itself is configured with.

use crate::cloud::{InstanceLookup, InstanceState};
use crate::error::{CloudError, CloudResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// [`InstanceLookup`] backed by the `aws` binary.
#[derive(Debug, Clone)]
pub struct AwsCli {
    binary: String,
    profile: Option<String>,
}

impl AwsCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            profile: None,
        }
    }

    /// Use a named profile from the AWS configuration.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    fn args(&self, ip: IpAddr, region: &str) -> Vec<String> {
        let mut args = vec![
            "ec2".to_string(),
            "describe-instances".to_string(),
            "--region".to_string(),
            region.to_string(),
            "--output".to_string(),
            "json".to_string(),
            "--filters".to_string(),
            format!("Name={},Values={}", address_filter(ip), ip),
        ];
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }
}

impl Default for AwsCli {
    fn default() -> Self {
        Self::new("aws")
    }
}

#[async_trait]
impl InstanceLookup for AwsCli {
    async fn instance_state(&self, ip: IpAddr, region: &str) -> CloudResult<InstanceState> {
        let args = self.args(ip, region);
        let command = format!("{} {}", self.binary, args.join(" "));
        debug!(%command, "querying instance state");

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| CloudError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CloudError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_instance_state(&output.stdout, ip, region)
    }
}

/// Filter name matching how the address is attached to the instance.
///
/// Private ranges are only ever on the primary interface; anything else is
/// looked up as a public address.
fn address_filter(ip: IpAddr) -> &'static str {
    match ip {
        IpAddr::V4(v4) if v4.is_private() || v4.is_loopback() || v4.is_link_local() => {
            "private-ip-address"
        }
        IpAddr::V4(_) => "ip-address",
        IpAddr::V6(_) => "network-interface.ipv6-addresses.ipv6-address",
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstances {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<Instance>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Instance {
    instance_id: Option<String>,
    state: State,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct State {
    name: String,
}

fn parse_instance_state(body: &[u8], ip: IpAddr, region: &str) -> CloudResult<InstanceState> {
    let response: DescribeInstances =
        serde_json::from_slice(body).map_err(|e| CloudError::InvalidResponse(e.to_string()))?;

    let mut instances = response
        .reservations
        .into_iter()
        .flat_map(|r| r.instances);

    let first = instances.next().ok_or_else(|| CloudError::InstanceNotFound {
        ip: ip.to_string(),
        region: region.to_string(),
    })?;

    let extra = instances.count();
    if extra > 0 {
        warn!(%ip, extra, "several instances share this address, using the first");
    }

    debug!(
        %ip,
        instance = first.instance_id.as_deref().unwrap_or("unknown"),
        state = %first.state.name,
        "instance state"
    );
    Ok(first.state.name.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNING: &str = r#"{
        "Reservations": [
            {
                "Instances": [
                    {
                        "InstanceId": "i-0abc123",
                        "PrivateIpAddress": "192.168.2.20",
                        "State": { "Code": 16, "Name": "running" }
                    }
                ]
            }
        ]
    }"#;

    fn db_ip() -> IpAddr {
        "192.168.2.20".parse().unwrap()
    }

    #[test]
    fn test_parse_running() {
        let state = parse_instance_state(RUNNING.as_bytes(), db_ip(), "eu-north-1").unwrap();
        assert_eq!(state, InstanceState::Running);
    }

    #[test]
    fn test_parse_no_instances() {
        let result = parse_instance_state(br#"{"Reservations": []}"#, db_ip(), "eu-north-1");
        assert!(matches!(result, Err(CloudError::InstanceNotFound { .. })));
    }

    #[test]
    fn test_parse_garbage() {
        let result = parse_instance_state(b"<html>", db_ip(), "eu-north-1");
        assert!(matches!(result, Err(CloudError::InvalidResponse(_))));
    }

    #[test]
    fn test_address_filter() {
        assert_eq!(address_filter(db_ip()), "private-ip-address");
        assert_eq!(address_filter("13.48.1.2".parse().unwrap()), "ip-address");
    }

    #[test]
    fn test_args() {
        let cli = AwsCli::default().with_profile("staging");
        let args = cli.args(db_ip(), "eu-north-1");
        assert_eq!(args[0..4], ["ec2", "describe-instances", "--region", "eu-north-1"]);
        assert!(args.contains(&"Name=private-ip-address,Values=192.168.2.20".to_string()));
        assert_eq!(args[args.len() - 2..], ["--profile", "staging"]);
    }
}
