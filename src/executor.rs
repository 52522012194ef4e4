//! Reachability executor.
//!
//! Attempts a single TCP connection per check, bounded by a timeout, and
//! closes it straight away. Refused, timed out and unresolvable endpoints
//! are all just "unreachable"; the outcome keeps the cause for operators.

use std::collections::HashSet;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};
use serde::Serialize;

use crate::resolver::EndpointCheck;

/// Default per-attempt connection timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Reasons a check is unreachable
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("cannot resolve {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("no address found for {addr}")]
    NoAddress { addr: String },

    #[error("dial tcp {addr}: i/o timeout")]
    Timeout { addr: String },

    #[error("dial tcp {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
}

/// `host:port` addresses treated as reachable without connecting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockSet {
    addrs: HashSet<String>,
}

impl MockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list, ignoring blank entries
    pub fn parse(list: &str) -> Self {
        list.split(',').collect()
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.addrs.contains(addr)
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for MockSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let addrs = iter
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { addrs }
    }
}

/// Executor configuration, fixed for the duration of a run
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub timeout: Duration,
    /// Log successful probes too
    pub verbose: bool,
    pub mock: MockSet,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            verbose: false,
            mock: MockSet::default(),
        }
    }
}

/// Result of probing one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub check: EndpointCheck,
    pub reachable: bool,
    /// Satisfied from the mock set, no connection attempted
    pub mocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ReachabilityExecutor {
    config: ExecutorConfig,
}

impl ReachabilityExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Probe one endpoint on behalf of `location`
    pub fn probe(&self, location: &str, check: &EndpointCheck) -> CheckOutcome {
        let addr = check.address();
        let verbose = self.config.verbose;

        if verbose {
            info!("{}: target={}: opening: {}", location, check.label, addr);
        }

        let start = Instant::now();
        let (mocked, result) = if self.config.mock.contains(&addr) {
            (true, Ok(()))
        } else {
            (false, open(check, &addr, self.config.timeout))
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                if verbose {
                    let how = if mocked { "mocked" } else { "connected" };
                    info!("{}: target={}: {}: {}", location, check.label, how, addr);
                }
                CheckOutcome {
                    check: check.clone(),
                    reachable: true,
                    mocked,
                    error: None,
                    elapsed_ms,
                }
            }
            Err(e) => {
                warn!("{}: target={}: failure: {}: {}", location, check.label, addr, e);
                CheckOutcome {
                    check: check.clone(),
                    reachable: false,
                    mocked,
                    error: Some(e.to_string()),
                    elapsed_ms,
                }
            }
        }
    }
}

/// Open and immediately drop a TCP connection to `check`.
///
/// Name resolution and every connect attempt share one deadline, so a
/// probe never blocks for longer than `timeout`. An empty host means the
/// local system.
fn open(check: &EndpointCheck, addr: &str, timeout: Duration) -> Result<(), ProbeError> {
    let deadline = Instant::now() + timeout;
    let host = check.host.trim().trim_start_matches('[').trim_end_matches(']');

    let candidates = if host.is_empty() {
        vec![
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), check.port),
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), check.port),
        ]
    } else {
        resolve_before(host, check.port, addr, deadline)?
    };

    connect_any(&candidates, addr, deadline)
}

/// Resolve `host` on a helper thread, giving up at `deadline`.
///
/// IP literals are returned directly without a lookup.
fn resolve_before(
    host: &str,
    port: u16,
    addr: &str,
    deadline: Instant,
) -> Result<Vec<SocketAddr>, ProbeError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let (tx, rx) = mpsc::channel();
    let name = host.to_string();
    // A lookup that outlives the deadline finishes in the background and
    // its result is dropped with the channel.
    thread::spawn(move || {
        let result = (name.as_str(), port)
            .to_socket_addrs()
            .map(|addrs| addrs.collect::<Vec<_>>());
        let _ = tx.send(result);
    });

    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(Ok(addrs)) => Ok(addrs),
        Ok(Err(source)) => Err(ProbeError::Resolve {
            addr: addr.to_string(),
            source,
        }),
        Err(RecvTimeoutError::Timeout) => Err(ProbeError::Timeout {
            addr: addr.to_string(),
        }),
        Err(RecvTimeoutError::Disconnected) => Err(ProbeError::NoAddress {
            addr: addr.to_string(),
        }),
    }
}

/// Try each candidate in order with whatever time is left before
/// `deadline`; the last connect error is reported if none succeeds.
fn connect_any(
    candidates: &[SocketAddr],
    addr: &str,
    deadline: Instant,
) -> Result<(), ProbeError> {
    if candidates.is_empty() {
        return Err(ProbeError::NoAddress {
            addr: addr.to_string(),
        });
    }

    let mut last_err = None;
    for sock in candidates {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match TcpStream::connect_timeout(sock, remaining) {
            Ok(stream) => {
                drop(stream);
                return Ok(());
            }
            Err(e) => last_err = Some(e),
        }
    }

    match last_err {
        Some(source) => Err(ProbeError::Connect {
            addr: addr.to_string(),
            source,
        }),
        None => Err(ProbeError::Timeout {
            addr: addr.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_mock_set_parsing() {
        let mock = MockSet::parse("h1:22, h2:443,,");
        assert_eq!(mock.len(), 2);
        assert!(mock.contains("h1:22"));
        assert!(mock.contains("h2:443"));
        assert!(!mock.contains(""));
        assert!(MockSet::parse("").is_empty());
    }

    #[test]
    fn test_mocked_address_skips_connection() {
        // Unresolvable host: only the mock set can make this pass
        let check = EndpointCheck::new("ccm", "no-such-host.invalid", 443);
        let executor = ReachabilityExecutor::new(ExecutorConfig {
            mock: MockSet::parse("no-such-host.invalid:443"),
            ..Default::default()
        });

        let outcome = executor.probe("browser", &check);
        assert!(outcome.reachable);
        assert!(outcome.mocked);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_listening_port_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let check = EndpointCheck::new("local", "127.0.0.1", port);

        let outcome = ReachabilityExecutor::default().probe("worker", &check);
        assert!(outcome.reachable, "error: {:?}", outcome.error);
        assert!(!outcome.mocked);
    }

    #[test]
    fn test_closed_port_is_unreachable_with_cause() {
        let port = closed_port();
        let check = EndpointCheck::new("local", "127.0.0.1", port);

        let outcome = ReachabilityExecutor::default().probe("worker", &check);
        assert!(!outcome.reachable);
        let error = outcome.error.unwrap();
        assert!(error.starts_with(&format!("dial tcp 127.0.0.1:{}", port)), "{}", error);
    }

    #[test]
    fn test_empty_host_dials_local_system() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let check = EndpointCheck::new("postgres", "", port);
        let outcome = ReachabilityExecutor::default().probe("ccm1", &check);
        assert!(outcome.reachable, "error: {:?}", outcome.error);
    }

    #[test]
    fn test_empty_host_with_nothing_listening() {
        let port = closed_port();
        let check = EndpointCheck::new("postgres", "", port);
        let outcome = ReachabilityExecutor::default().probe("ccm1", &check);
        assert!(!outcome.reachable);
        assert!(outcome.error.unwrap().starts_with(&format!("dial tcp :{}", port)));
    }

    #[test]
    fn test_expired_deadline_attempts_nothing() {
        // Even a listening address is not tried once the deadline has passed
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let sock = listener.local_addr().unwrap();
        let deadline = Instant::now() - Duration::from_millis(1);

        let err = connect_any(&[sock], "local", deadline).unwrap_err();
        assert!(matches!(err, ProbeError::Timeout { .. }), "{}", err);
        assert_eq!(err.to_string(), "dial tcp local: i/o timeout");
    }

    #[test]
    fn test_many_candidates_share_one_timeout() {
        // TEST-NET-1 addresses are never routed: each attempt either hangs
        // or fails at once, but together they stay within one timeout.
        let candidates: Vec<SocketAddr> = (1..=4)
            .map(|i| SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, i)), 9))
            .collect();
        let timeout = Duration::from_millis(300);

        let start = Instant::now();
        let result = connect_any(&candidates, "blackhole:9", start + timeout);
        let elapsed = start.elapsed();

        assert!(result.is_err());
        assert!(elapsed < timeout + Duration::from_millis(200), "took {:?}", elapsed);
    }

    #[test]
    fn test_no_candidates() {
        let err = connect_any(&[], "x:1", Instant::now() + DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, ProbeError::NoAddress { .. }));
    }

    #[test]
    fn test_ip_literal_skips_lookup() {
        let deadline = Instant::now() + DEFAULT_TIMEOUT;
        let addrs = resolve_before("::1", 22, "[::1]:22", deadline).unwrap();
        assert_eq!(addrs, vec![SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 22)]);
    }

    #[test]
    fn test_mock_only_matches_exact_port() {
        let port = closed_port();
        let executor = ReachabilityExecutor::new(ExecutorConfig {
            mock: MockSet::parse(&format!("127.0.0.1:{}", port)),
            ..Default::default()
        });

        assert!(executor.probe("x", &EndpointCheck::new("a", "127.0.0.1", port)).reachable);
        let other = EndpointCheck::new("a", "127.0.0.1", closed_port());
        // A different ephemeral port is not mocked
        if other.port != port {
            assert!(!executor.probe("x", &other).reachable);
        }
    }
}
