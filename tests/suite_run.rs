//! End-to-end suite runs against fake provisioning and cloud backends.

use async_trait::async_trait;
use infraprobe::cloud::{InstanceLookup, InstanceState};
use infraprobe::config::{ExposureRule, InstanceSpec, SuiteConfig};
use infraprobe::error::{CloudError, CloudResult, ProvisionError, ProvisionResult};
use infraprobe::probe::Expectation;
use infraprobe::provision::{Provisioner, Teardown};
use infraprobe::suite::{self, CheckKind};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_test::{assert_err, assert_ok};

/// Records lifecycle calls and serves fixed outputs.
#[derive(Default)]
struct FakeModule {
    outputs: HashMap<String, String>,
    fail_apply: bool,
    applies: AtomicUsize,
    destroys: AtomicUsize,
}

impl FakeModule {
    fn with_outputs(outputs: &[(&str, &str)]) -> Self {
        Self {
            outputs: outputs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Provisioner for FakeModule {
    async fn init_and_apply(&self) -> ProvisionResult<()> {
        self.applies.fetch_add(1, Ordering::SeqCst);
        if self.fail_apply {
            return Err(ProvisionError::CommandFailed {
                command: "terragrunt apply".to_string(),
                status: "exit code 1".to_string(),
                stderr: "Error: no valid credential sources".to_string(),
            });
        }
        Ok(())
    }

    async fn output(&self, key: &str) -> ProvisionResult<String> {
        self.outputs
            .get(key)
            .cloned()
            .ok_or_else(|| ProvisionError::EmptyOutput(key.to_string()))
    }

    async fn destroy(&self) -> ProvisionResult<()> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Every known address is running; anything else is not found.
struct FakeCloud {
    running: Vec<IpAddr>,
}

#[async_trait]
impl InstanceLookup for FakeCloud {
    async fn instance_state(&self, ip: IpAddr, region: &str) -> CloudResult<InstanceState> {
        if self.running.contains(&ip) {
            Ok(InstanceState::Running)
        } else {
            Err(CloudError::InstanceNotFound {
                ip: ip.to_string(),
                region: region.to_string(),
            })
        }
    }
}

fn loopback_suite(http_port: u16, db_port: u16) -> SuiteConfig {
    SuiteConfig {
        vpc_cidr: "127.0.0.0/8".to_string(),
        instances: vec![
            InstanceSpec {
                name: "http".to_string(),
                output: "http_ip".to_string(),
                subnet: "127.0.1.0/24".to_string(),
            },
            InstanceSpec {
                name: "db".to_string(),
                output: "db_ip".to_string(),
                subnet: "127.0.2.0/24".to_string(),
            },
        ],
        exposure: vec![
            ExposureRule {
                instance: "http".to_string(),
                port: http_port.to_string(),
                timeout_ms: 2000,
                expect: Expectation::Reachable,
            },
            ExposureRule {
                instance: "db".to_string(),
                port: db_port.to_string(),
                timeout_ms: 2000,
                expect: Expectation::Blocked,
            },
        ],
        ..SuiteConfig::default()
    }
}

#[tokio::test]
async fn test_apply_failure_still_destroys() {
    let module = FakeModule {
        fail_apply: true,
        ..FakeModule::default()
    };
    let cloud = FakeCloud { running: vec![] };
    let suite = SuiteConfig::default();

    let deployment = suite::run_suite(&suite, &module, &cloud, Teardown::Destroy).await;

    assert_err!(deployment.result);
    assert_ok!(deployment.teardown);
    assert_eq!(module.applies.load(Ordering::SeqCst), 1);
    assert_eq!(module.destroys.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_outputs_fail_dependent_checks() {
    let module = FakeModule::with_outputs(&[("http_ip", "192.168.1.10")]);
    let cloud = FakeCloud {
        running: vec!["192.168.1.10".parse().unwrap()],
    };
    let suite = SuiteConfig {
        exposure: vec![],
        ..SuiteConfig::default()
    };

    let deployment = suite::run_suite(&suite, &module, &cloud, Teardown::Destroy).await;
    let report = assert_ok!(deployment.result);

    assert!(!report.all_passed());
    let failed: Vec<_> = report.failures().map(|c| (c.check, c.subject.as_str())).collect();
    assert_eq!(
        failed,
        vec![
            (CheckKind::OutputPresent, "db"),
            (CheckKind::InstanceRunning, "db"),
            (CheckKind::VpcPlacement, "db"),
            (CheckKind::SubnetPlacement, "db"),
        ]
    );
    assert_eq!(module.destroys.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_keep_skips_destroy() {
    let module = FakeModule::with_outputs(&[("http_ip", "192.168.1.10"), ("db_ip", "192.168.2.20")]);
    let cloud = FakeCloud {
        running: vec!["192.168.1.10".parse().unwrap(), "192.168.2.20".parse().unwrap()],
    };
    let suite = SuiteConfig {
        exposure: vec![],
        ..SuiteConfig::default()
    };

    let deployment = suite::run_suite(&suite, &module, &cloud, Teardown::Keep).await;
    let report = assert_ok!(deployment.into_result());

    assert!(report.all_passed());
    assert_eq!(report.checks.len(), 8);
    assert_eq!(module.destroys.load(Ordering::SeqCst), 0);
}

// Binding 127.0.1.x and 127.0.2.x needs the whole 127/8 on loopback.
#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_loopback_deployment() {
    use tokio::net::TcpListener;

    let http = TcpListener::bind("127.0.1.10:0").await.unwrap();
    let http_port = http.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((_stream, _)) = http.accept().await {}
    });

    // Reserve a port on the db address, then free it so connecting is refused.
    let db = TcpListener::bind("127.0.2.20:0").await.unwrap();
    let db_port = db.local_addr().unwrap().port();
    drop(db);

    let module = FakeModule::with_outputs(&[("http_ip", "127.0.1.10"), ("db_ip", "127.0.2.20")]);
    let cloud = FakeCloud {
        running: vec!["127.0.1.10".parse().unwrap(), "127.0.2.20".parse().unwrap()],
    };
    let suite = loopback_suite(http_port, db_port);

    let deployment = suite::run_suite(&suite, &module, &cloud, Teardown::Destroy).await;
    let report = assert_ok!(deployment.result);

    let exposure: Vec<_> = report
        .checks
        .iter()
        .filter(|c| c.check == CheckKind::PortExposure)
        .collect();
    assert_eq!(exposure.len(), 2);
    assert!(exposure[0].passed, "{}", exposure[0].detail);

    // A refused connection is an error, not a block.
    assert!(!exposure[1].passed);
    assert!(exposure[1].detail.contains("unexpected error"), "{}", exposure[1].detail);

    assert_eq!(report.failed_count(), 1);
    assert_eq!(module.destroys.load(Ordering::SeqCst), 1);
}
