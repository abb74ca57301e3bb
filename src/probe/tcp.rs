//! TCP connect probe.
//!
//! Opens one connection with the operating system's socket API, bounded by
//! the target's timeout, and closes it again straight away. The deadline
//! covers name resolution as well as the handshake.
//!
//! Timeouts are recognised structurally: either the deadline elapsed, or
//! `connect` itself returned `io::ErrorKind::TimedOut`. Error text is never
//! compared, since its wording differs between platforms.

use crate::probe::{Connection, FailureKind, ProbeFailure, ProbeResult};
use crate::types::ProbeTarget;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Why an attempt did not produce a connection.
#[derive(Debug)]
pub(crate) enum AttemptError {
    Resolve(String),
    Connect(SocketAddr, io::Error),
}

/// Something holding an open connection.
pub(crate) trait Stream {
    fn local_addr(&self) -> Option<SocketAddr>;
}

impl Stream for TcpStream {
    fn local_addr(&self) -> Option<SocketAddr> {
        TcpStream::local_addr(self).ok()
    }
}

/// Probe a target: one bounded TCP connect attempt, no retries.
pub async fn probe(target: &ProbeTarget) -> ProbeResult {
    let connect = async {
        let addr = target.resolve().await.map_err(AttemptError::Resolve)?;
        debug!(%addr, "connecting");
        TcpStream::connect(addr)
            .await
            .map(|stream| (addr, stream))
            .map_err(|e| AttemptError::Connect(addr, e))
    };
    attempt(target, connect).await
}

/// Run a connect future under the target's deadline and classify the result.
///
/// Any stream produced is dropped, and therefore closed, before this returns.
pub(crate) async fn attempt<S, F>(target: &ProbeTarget, connect: F) -> ProbeResult
where
    S: Stream,
    F: Future<Output = Result<(SocketAddr, S), AttemptError>>,
{
    let start = Instant::now();
    let limit = target.timeout();

    let result = match timeout(limit, connect).await {
        Ok(Ok((peer, stream))) => {
            let connection = Connection {
                peer,
                local: stream.local_addr(),
                connect_time: start.elapsed(),
            };
            drop(stream);
            ProbeResult::Reachable(connection)
        }
        Ok(Err(AttemptError::Connect(addr, e))) => classify_connect_error(target, addr, e),
        Ok(Err(AttemptError::Resolve(reason))) => ProbeResult::Failed(ProbeFailure {
            kind: FailureKind::Resolution,
            message: format!("dial {}: {}", target, reason),
        }),
        Err(_) => ProbeResult::Blocked(format!(
            "dial {}: timed out after {} ms",
            target,
            limit.as_millis()
        )),
    };

    debug!(
        addr = %target,
        outcome = %result.outcome(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "probe finished"
    );
    result
}

/// Sort an error returned by `connect` into Blocked or Failed.
fn classify_connect_error(target: &ProbeTarget, addr: SocketAddr, e: io::Error) -> ProbeResult {
    let kind = match e.kind() {
        io::ErrorKind::TimedOut => {
            return ProbeResult::Blocked(format!("dial {} ({}): {}", target, addr, e));
        }
        io::ErrorKind::ConnectionRefused => FailureKind::Refused,
        io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
            FailureKind::Unreachable
        }
        _ => FailureKind::Other,
    };

    ProbeResult::Failed(ProbeFailure {
        kind,
        message: format!("dial {} ({}): {}", target, addr, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeOutcome;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// Stand-in stream that counts how many instances are still alive.
    struct Tracked(Arc<AtomicUsize>);

    impl Tracked {
        fn open(counter: &Arc<AtomicUsize>) -> Self {
            counter.fetch_add(1, Ordering::SeqCst);
            Self(Arc::clone(counter))
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl Stream for Tracked {
        fn local_addr(&self) -> Option<SocketAddr> {
            None
        }
    }

    fn target(host: &str, port: u16, timeout_ms: u64) -> ProbeTarget {
        ProbeTarget::new(host, &port.to_string(), Duration::from_millis(timeout_ms)).unwrap()
    }

    fn peer() -> SocketAddr {
        "10.0.0.5:5432".parse().unwrap()
    }

    #[tokio::test]
    async fn test_probe_reachable_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = probe(&target("127.0.0.1", port, 2000)).await;

        match result {
            ProbeResult::Reachable(conn) => {
                assert_eq!(conn.peer.port(), port);
                assert!(conn.local.is_some());
            }
            other => panic!("expected reachable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_refused_is_failed() {
        // Bind then drop to get a port with no listener
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = probe(&target("127.0.0.1", port, 2000)).await;

        match result {
            ProbeResult::Failed(failure) => assert_eq!(failure.kind, FailureKind::Refused),
            other => panic!("expected refused, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pending_connect_is_blocked() {
        let t = target("10.0.0.5", 5432, 50);
        let connect = std::future::pending::<Result<(SocketAddr, Tracked), AttemptError>>();

        let result = attempt(&t, connect).await;

        match result {
            ProbeResult::Blocked(reason) => {
                assert!(reason.contains("10.0.0.5:5432"));
                assert!(reason.contains("timed out after 50 ms"));
            }
            other => panic!("expected blocked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_os_timeout_is_blocked() {
        let t = target("10.0.0.5", 5432, 2000);
        let connect = async {
            Err::<(SocketAddr, Tracked), _>(AttemptError::Connect(
                peer(),
                io::Error::from(io::ErrorKind::TimedOut),
            ))
        };

        assert_eq!(attempt(&t, connect).await.outcome(), ProbeOutcome::Blocked);
    }

    #[tokio::test]
    async fn test_unreachable_is_failed() {
        let t = target("10.0.0.5", 5432, 2000);
        let connect = async {
            Err::<(SocketAddr, Tracked), _>(AttemptError::Connect(
                peer(),
                io::Error::from(io::ErrorKind::NetworkUnreachable),
            ))
        };

        match attempt(&t, connect).await {
            ProbeResult::Failed(failure) => assert_eq!(failure.kind, FailureKind::Unreachable),
            other => panic!("expected failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolution_error_is_failed() {
        let t = target("db.example.invalid", 5432, 2000);
        let connect = async {
            Err::<(SocketAddr, Tracked), _>(AttemptError::Resolve(
                "no IP addresses found".to_string(),
            ))
        };

        match attempt(&t, connect).await {
            ProbeResult::Failed(failure) => {
                assert_eq!(failure.kind, FailureKind::Resolution);
                assert!(failure.message.contains("db.example.invalid:5432"));
            }
            other => panic!("expected failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_closed_after_reachable() {
        let open = Arc::new(AtomicUsize::new(0));
        let t = target("10.0.0.5", 5432, 2000);
        let counter = Arc::clone(&open);
        let connect = async move { Ok::<_, AttemptError>((peer(), Tracked::open(&counter))) };

        let result = attempt(&t, connect).await;

        assert_eq!(result.outcome(), ProbeOutcome::Reachable);
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_handle_retained_after_timeout() {
        let open = Arc::new(AtomicUsize::new(0));
        let t = target("10.0.0.5", 5432, 30);
        let counter = Arc::clone(&open);
        // Holds a half-open handle while it waits, like a stalled handshake
        let connect = async move {
            let _pending = Tracked::open(&counter);
            std::future::pending::<()>().await;
            Ok::<_, AttemptError>((peer(), Tracked::open(&counter)))
        };

        let result = attempt(&t, connect).await;

        assert_eq!(result.outcome(), ProbeOutcome::Blocked);
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repeated_probes_are_stable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let t = target("127.0.0.1", port, 2000);

        for _ in 0..3 {
            assert_eq!(probe(&t).await.outcome(), ProbeOutcome::Reachable);
        }

        drop(listener);
        for _ in 0..3 {
            assert_eq!(probe(&t).await.outcome(), ProbeOutcome::Failed);
        }
    }

    #[tokio::test]
    async fn test_concurrent_probes_are_independent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open_port = listener.local_addr().unwrap().port();
        let closed_port = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap().port()
        };

        let open = target("127.0.0.1", open_port, 2000);
        let closed = target("127.0.0.1", closed_port, 2000);
        let (a, b) = tokio::join!(probe(&open), probe(&closed));

        assert_eq!(a.outcome(), ProbeOutcome::Reachable);
        assert_eq!(b.outcome(), ProbeOutcome::Failed);
    }
}
