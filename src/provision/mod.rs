//! Provisioning lifecycle.
//!
//! Infrastructure is brought up by an external tool (Terraform or
//! Terragrunt). This module drives it through the [`Provisioner`] trait and
//! wraps apply and destroy around a body of checks with
//! [`with_deployment`].

mod lifecycle;
mod terraform;

pub use lifecycle::{with_deployment, Deployment, Teardown};
pub use terraform::{Terraform, TerraformOptions};

use crate::error::ProvisionResult;
use async_trait::async_trait;

/// Apply, read outputs from, and destroy one infrastructure module.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Initialise the working directory and apply the module.
    async fn init_and_apply(&self) -> ProvisionResult<()>;

    /// Read one output value as a string.
    async fn output(&self, key: &str) -> ProvisionResult<String>;

    /// Destroy everything the module created.
    async fn destroy(&self) -> ProvisionResult<()>;
}
