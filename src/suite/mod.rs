//! Verification suite.
//!
//! Deploys a module once, runs every check against it, and destroys it:
//!
//! 1. outputs hold IP addresses
//! 2. instances are running
//! 3. instances sit inside the VPC
//! 4. instances sit in their own subnet and no other
//! 5. exposure rules hold (e.g. the database port times out)

pub mod checks;
mod report;

pub use report::{CheckKind, CheckResult, SuiteReport};

use crate::cloud::InstanceLookup;
use crate::config::SuiteConfig;
use crate::provision::{with_deployment, Deployment, Provisioner, Teardown};
use tracing::info;

/// Run every check against an already-applied deployment.
pub async fn verify<P, L>(suite: &SuiteConfig, provisioner: &P, lookup: &L) -> SuiteReport
where
    P: Provisioner + ?Sized,
    L: InstanceLookup + ?Sized,
{
    let mut report = SuiteReport::default();

    let (outputs, addresses) = checks::read_outputs(provisioner, &suite.instances).await;
    report.extend(outputs);

    report.extend(
        checks::instances_running(lookup, &suite.region, &suite.instances, &addresses).await,
    );
    report.extend(checks::vpc_placement(
        &suite.vpc_cidr,
        &suite.instances,
        &addresses,
    ));
    report.extend(checks::subnet_placement(&suite.instances, &addresses));
    report.extend(checks::port_exposure(&suite.exposure, &addresses).await);

    info!(
        passed = report.passed_count(),
        failed = report.failed_count(),
        "suite finished"
    );
    report
}

/// Apply the suite's module, verify it, then tear down.
pub async fn run_suite<P, L>(
    suite: &SuiteConfig,
    provisioner: &P,
    lookup: &L,
    teardown: Teardown,
) -> Deployment<SuiteReport>
where
    P: Provisioner + ?Sized,
    L: InstanceLookup + ?Sized,
{
    with_deployment(provisioner, teardown, || verify(suite, provisioner, lookup)).await
}
