//! The individual checks.
//!
//! Each check takes the addresses read from the module outputs and returns
//! one result per subject. An instance whose address could not be read
//! fails every check that needs it with "output unavailable".

use crate::cloud::InstanceLookup;
use crate::config::{ExposureRule, InstanceSpec};
use crate::network::cidr_contains;
use crate::probe;
use crate::provision::Provisioner;
use crate::suite::report::{CheckKind, CheckResult};
use crate::types::{Host, Port, ProbeTarget};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::{debug, info};

/// Instance name to address, for instances whose output was readable.
pub type Addresses = BTreeMap<String, IpAddr>;

const UNAVAILABLE: &str = "output unavailable";

/// Read every instance's output and check it holds an IP address.
pub async fn read_outputs<P>(
    provisioner: &P,
    instances: &[InstanceSpec],
) -> (Vec<CheckResult>, Addresses)
where
    P: Provisioner + ?Sized,
{
    let mut results = Vec::with_capacity(instances.len());
    let mut addresses = Addresses::new();

    for instance in instances {
        let result = match provisioner.output(&instance.output).await {
            Ok(value) => match value.trim().parse::<IpAddr>() {
                Ok(ip) => {
                    debug!(instance = %instance.name, %ip, "output read");
                    addresses.insert(instance.name.clone(), ip);
                    CheckResult::pass(
                        CheckKind::OutputPresent,
                        &instance.name,
                        format!("{} = {}", instance.output, ip),
                    )
                }
                Err(_) => CheckResult::fail(
                    CheckKind::OutputPresent,
                    &instance.name,
                    format!("{} = '{}' is not an IP address", instance.output, value),
                ),
            },
            Err(e) => CheckResult::fail(CheckKind::OutputPresent, &instance.name, e.to_string()),
        };
        results.push(result);
    }

    (results, addresses)
}

/// Every instance must be in the `running` state.
pub async fn instances_running<L>(
    lookup: &L,
    region: &str,
    instances: &[InstanceSpec],
    addresses: &Addresses,
) -> Vec<CheckResult>
where
    L: InstanceLookup + ?Sized,
{
    let mut results = Vec::with_capacity(instances.len());

    for instance in instances {
        let Some(&ip) = addresses.get(&instance.name) else {
            results.push(CheckResult::fail(
                CheckKind::InstanceRunning,
                &instance.name,
                UNAVAILABLE,
            ));
            continue;
        };

        let result = match lookup.instance_state(ip, region).await {
            Ok(state) if state.is_running() => {
                CheckResult::pass(CheckKind::InstanceRunning, &instance.name, "running")
            }
            Ok(state) => CheckResult::fail(
                CheckKind::InstanceRunning,
                &instance.name,
                format!("expected running, found {}", state),
            ),
            Err(e) => CheckResult::fail(CheckKind::InstanceRunning, &instance.name, e.to_string()),
        };
        results.push(result);
    }

    results
}

/// Every instance must sit inside the VPC block.
pub fn vpc_placement(
    vpc_cidr: &str,
    instances: &[InstanceSpec],
    addresses: &Addresses,
) -> Vec<CheckResult> {
    instances
        .iter()
        .map(|instance| {
            let Some(ip) = addresses.get(&instance.name) else {
                return CheckResult::fail(CheckKind::VpcPlacement, &instance.name, UNAVAILABLE);
            };
            match cidr_contains(&ip.to_string(), vpc_cidr) {
                Ok(true) => CheckResult::pass(
                    CheckKind::VpcPlacement,
                    &instance.name,
                    format!("{} in {}", ip, vpc_cidr),
                ),
                Ok(false) => CheckResult::fail(
                    CheckKind::VpcPlacement,
                    &instance.name,
                    format!("{} is outside {}", ip, vpc_cidr),
                ),
                Err(e) => CheckResult::fail(CheckKind::VpcPlacement, &instance.name, e.to_string()),
            }
        })
        .collect()
}

/// Every instance must sit in its own subnet and in no other instance's subnet.
pub fn subnet_placement(instances: &[InstanceSpec], addresses: &Addresses) -> Vec<CheckResult> {
    instances
        .iter()
        .map(|instance| {
            let Some(ip) = addresses.get(&instance.name) else {
                return CheckResult::fail(CheckKind::SubnetPlacement, &instance.name, UNAVAILABLE);
            };
            match placement_problem(instance, *ip, instances) {
                Ok(None) => CheckResult::pass(
                    CheckKind::SubnetPlacement,
                    &instance.name,
                    format!("{} in {}", ip, instance.subnet),
                ),
                Ok(Some(problem)) => {
                    CheckResult::fail(CheckKind::SubnetPlacement, &instance.name, problem)
                }
                Err(e) => {
                    CheckResult::fail(CheckKind::SubnetPlacement, &instance.name, e.to_string())
                }
            }
        })
        .collect()
}

fn placement_problem(
    instance: &InstanceSpec,
    ip: IpAddr,
    instances: &[InstanceSpec],
) -> Result<Option<String>, crate::error::CidrError> {
    let addr = ip.to_string();

    if !cidr_contains(&addr, &instance.subnet)? {
        return Ok(Some(format!("{} is outside {}", ip, instance.subnet)));
    }

    for other in instances.iter().filter(|o| o.name != instance.name) {
        // Nested subnets would make this unanswerable; only flag disjoint ones
        if other.subnet == instance.subnet || cidr_contains(&instance.subnet, &other.subnet)? {
            continue;
        }
        if cidr_contains(&addr, &other.subnet)? {
            return Ok(Some(format!(
                "{} is inside {}, the subnet of '{}'",
                ip, other.subnet, other.name
            )));
        }
    }

    Ok(None)
}

/// Probe every exposure rule concurrently and judge each against its expectation.
pub async fn port_exposure(rules: &[ExposureRule], addresses: &Addresses) -> Vec<CheckResult> {
    let checks = rules.iter().map(|rule| async move {
        let subject = format!("{}:{}", rule.instance, rule.port);

        let Some(&ip) = addresses.get(&rule.instance) else {
            return CheckResult::fail(CheckKind::PortExposure, subject, UNAVAILABLE);
        };

        let target = match rule
            .port
            .parse::<Port>()
            .and_then(|port| ProbeTarget::from_parts(Host::Ip(ip), port, rule.timeout()))
        {
            Ok(target) => target,
            Err(e) => return CheckResult::fail(CheckKind::PortExposure, subject, e.to_string()),
        };

        let result = probe::probe(&target).await;
        let verdict = result.verdict(rule.expect);
        info!(
            subject = %subject,
            outcome = %result.outcome(),
            passed = verdict.passed(),
            "exposure probe"
        );

        let detail = format!("{}: {}", verdict.message(), result.diagnostic());
        if verdict.passed() {
            CheckResult::pass(CheckKind::PortExposure, subject, detail)
        } else {
            CheckResult::fail(CheckKind::PortExposure, subject, detail)
        }
    });

    join_all(checks).await
}
