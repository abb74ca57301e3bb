//! Scoped deployments.
//!
//! [`with_deployment`] is the apply-once, check, always-destroy bracket:
//! destroy runs whether apply failed, the body finished, or the body
//! panicked.

use crate::error::ProvisionResult;
use crate::provision::Provisioner;
use futures::FutureExt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, info, warn};

/// What to do with the infrastructure once the body has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Teardown {
    /// Destroy it.
    #[default]
    Destroy,
    /// Leave it running, e.g. to debug a failing check by hand.
    Keep,
}

/// The body's result and the teardown's result, kept apart so a failed
/// destroy never hides what the checks found.
#[derive(Debug)]
pub struct Deployment<T> {
    /// Value of the body, or the apply error that prevented running it.
    pub result: ProvisionResult<T>,
    /// Outcome of destroy; `Ok` when teardown was skipped.
    pub teardown: ProvisionResult<()>,
}

impl<T> Deployment<T> {
    /// Collapse into one result: the body's value only if teardown succeeded too.
    pub fn into_result(self) -> ProvisionResult<T> {
        let value = self.result?;
        self.teardown?;
        Ok(value)
    }
}

/// Apply the module, run `body`, then tear down according to `teardown`.
///
/// A panic inside `body` is caught, teardown runs, and the panic resumes.
pub async fn with_deployment<P, F, Fut, T>(
    provisioner: &P,
    teardown: Teardown,
    body: F,
) -> Deployment<T>
where
    P: Provisioner + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let result = match provisioner.init_and_apply().await {
        Ok(()) => {
            info!("deployment applied");
            match AssertUnwindSafe(body()).catch_unwind().await {
                Ok(value) => Ok(value),
                Err(payload) => {
                    error!("check body panicked, tearing down before propagating");
                    let _ = finish(provisioner, teardown).await;
                    panic::resume_unwind(payload);
                }
            }
        }
        Err(e) => {
            error!(error = %e, "apply failed");
            Err(e)
        }
    };

    let teardown = finish(provisioner, teardown).await;
    Deployment { result, teardown }
}

async fn finish<P>(provisioner: &P, teardown: Teardown) -> ProvisionResult<()>
where
    P: Provisioner + ?Sized,
{
    match teardown {
        Teardown::Keep => {
            warn!("keeping infrastructure, destroy it manually when done");
            Ok(())
        }
        Teardown::Destroy => match provisioner.destroy().await {
            Ok(()) => {
                info!("deployment destroyed");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "destroy failed, resources may still exist");
                Err(e)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProvisionError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        applies: AtomicUsize,
        destroys: AtomicUsize,
        fail_apply: bool,
        fail_destroy: bool,
    }

    #[async_trait]
    impl Provisioner for Counting {
        async fn init_and_apply(&self) -> ProvisionResult<()> {
            self.applies.fetch_add(1, Ordering::SeqCst);
            if self.fail_apply {
                return Err(ProvisionError::CommandFailed {
                    command: "terraform apply".into(),
                    status: "exit code 1".into(),
                    stderr: "quota exceeded".into(),
                });
            }
            Ok(())
        }

        async fn output(&self, key: &str) -> ProvisionResult<String> {
            Err(ProvisionError::EmptyOutput(key.to_string()))
        }

        async fn destroy(&self) -> ProvisionResult<()> {
            self.destroys.fetch_add(1, Ordering::SeqCst);
            if self.fail_destroy {
                return Err(ProvisionError::CommandFailed {
                    command: "terraform destroy".into(),
                    status: "exit code 1".into(),
                    stderr: "dependency violation".into(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_destroy_after_body() {
        let p = Counting::default();
        let deployment = with_deployment(&p, Teardown::Destroy, || async { 42 }).await;

        assert_eq!(deployment.into_result().unwrap(), 42);
        assert_eq!(p.applies.load(Ordering::SeqCst), 1);
        assert_eq!(p.destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_destroy_after_failed_apply() {
        let p = Counting {
            fail_apply: true,
            ..Default::default()
        };
        let ran = AtomicUsize::new(0);
        let deployment = with_deployment(&p, Teardown::Destroy, || async {
            ran.fetch_add(1, Ordering::SeqCst);
        })
        .await;

        assert!(deployment.result.is_err());
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(p.destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_destroy_after_panic() {
        let p = Counting::default();
        let outcome = AssertUnwindSafe(with_deployment(&p, Teardown::Destroy, || async {
            panic!("assertion failed");
        }))
        .catch_unwind()
        .await;

        assert!(outcome.is_err());
        assert_eq!(p.destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_keep_skips_destroy() {
        let p = Counting::default();
        let deployment = with_deployment(&p, Teardown::Keep, || async { "ok" }).await;

        assert!(deployment.teardown.is_ok());
        assert_eq!(p.destroys.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_destroy_failure_keeps_body_value() {
        let p = Counting {
            fail_destroy: true,
            ..Default::default()
        };
        let deployment = with_deployment(&p, Teardown::Destroy, || async { 7 }).await;

        assert_eq!(*deployment.result.as_ref().unwrap(), 7);
        assert!(deployment.teardown.is_err());
        assert!(deployment.into_result().is_err());
    }
}
