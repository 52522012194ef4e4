//! Endpoint resolution.
//!
//! Maps a classified [`Role`] to the ordered list of endpoints that role is
//! required to reach. Global checks come first, then per-region checks in
//! topology order, then per-node checks in list order, so resolving the same
//! role against the same topology always yields the same sequence.

use std::fmt;

use serde::Serialize;

use crate::ports;
use crate::role::{classify, ResolveError, Role};
use crate::topology::{Node, Region, Topology};

/// One reachability probe
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EndpointCheck {
    /// What the endpoint is, e.g. `ccm` or `eu,rabbit-lb-public`
    pub label: String,
    pub host: String,
    pub port: u16,
}

impl EndpointCheck {
    pub fn new(label: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            label: label.into(),
            host: host.into(),
            port,
        }
    }

    /// `host:port`, bracketing bare IPv6 literals
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for EndpointCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target={} {}", self.label, self.address())
    }
}

/// Resolution knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Keep member-to-self checks (a node probing its own listed host)
    pub include_self: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { include_self: true }
    }
}

/// Accumulates checks in the order they are pushed
struct Plan {
    checks: Vec<EndpointCheck>,
}

impl Plan {
    fn new() -> Self {
        Self { checks: Vec::new() }
    }

    fn push(&mut self, label: impl Into<String>, host: &str, port: u16) {
        self.checks.push(EndpointCheck::new(label, host, port));
    }

    fn push_ports(&mut self, label: &str, host: &str, ports: &[u16]) {
        for &port in ports {
            self.push(label, host, port);
        }
    }
}

fn region_label(region: &Region, what: &str) -> String {
    format!("{},{}", region.name, what)
}

/// Resolve an identity string in one step.
///
/// Fails only when classification fails; a recognized role with nothing to
/// check yields an empty list.
pub fn resolve_identity(
    identity: &str,
    topology: &Topology,
    options: ResolveOptions,
) -> Result<Vec<EndpointCheck>, ResolveError> {
    let role = classify(identity, topology)?;
    Ok(resolve(&role, topology, options))
}

/// Build the ordered check list for an already classified role
pub fn resolve(
    role: &Role<'_>,
    topology: &Topology,
    options: ResolveOptions,
) -> Vec<EndpointCheck> {
    let mut plan = Plan::new();
    match role {
        Role::Browser => browser(&mut plan, topology),
        Role::Worker => worker(&mut plan, topology),
        Role::FleetMember { name } => fleet_member(&mut plan, topology, name, options),
        Role::ServiceMember { region, node } => {
            service_member(&mut plan, topology, region, node, options)
        }
        Role::BrokerMember { region, node } => {
            broker_member(&mut plan, topology, region, node, options)
        }
    }
    plan.checks
}

fn browser(plan: &mut Plan, topology: &Topology) {
    plan.push("ccm", &topology.fleet_endpoint, ports::HTTPS);
    plan.push("log-collector", &topology.log_collector, ports::LOG_WEB);
    for region in topology.regions() {
        plan.push(region_label(region, "rabbit-lb-public"), &region.broker_public, ports::HTTPS);
    }
}

fn worker(plan: &mut Plan, topology: &Topology) {
    for region in topology.regions() {
        let label = region_label(region, "rabbit-lb-public");
        plan.push_ports(&label, &region.broker_public, &ports::WORKER_BROKER);
    }
}

fn fleet_member(plan: &mut Plan, topology: &Topology, name: &str, options: ResolveOptions) {
    plan.push("postgres", &topology.postgres, ports::POSTGRES);
    plan.push("log-collector", &topology.log_collector, ports::LOG_INGEST);
    plan.push("log-collector", &topology.log_collector, ports::LOG_API);
    for region in topology.regions() {
        let label = region_label(region, "cco-lb");
        plan.push(label, &region.service_endpoint, ports::SECURE_MANAGEMENT);
    }
    for member in &topology.fleet {
        if !options.include_self && member.name == name {
            continue;
        }
        plan.push(member.name.as_str(), &member.host, ports::SSH);
    }
}

fn service_member(
    plan: &mut Plan,
    topology: &Topology,
    region: &Region,
    me: &Node,
    options: ResolveOptions,
) {
    plan.push("log-collector", &topology.log_collector, ports::LOG_INGEST);
    plan.push("log-collector", &topology.log_collector, ports::LOG_API);
    plan.push("ccm", &topology.fleet_endpoint, ports::SECURE_MANAGEMENT);

    let public = region_label(region, "rabbit-lb-public");
    let private = region_label(region, "rabbit-lb-private");
    plan.push(public, &region.broker_public, ports::SECURE_AMQP);
    plan.push(private, &region.broker_private, ports::SECURE_AMQP);

    for other in &region.service_nodes {
        if !options.include_self && other.name == me.name {
            continue;
        }
        plan.push_ports(&region_label(region, &other.name), &other.host, &ports::SERVICE_MEMBER);
    }
}

fn broker_member(
    plan: &mut Plan,
    topology: &Topology,
    region: &Region,
    me: &Node,
    options: ResolveOptions,
) {
    plan.push("ccm", &topology.fleet_endpoint, ports::HTTPS);

    plan.push(region_label(region, "cco-lb"), &region.service_endpoint, ports::SECURE_MANAGEMENT);

    // Public then private for each link port
    for port in ports::BROKER_LINK {
        plan.push(region_label(region, "rabbit-lb-public"), &region.broker_public, port);
        plan.push(region_label(region, "rabbit-lb-private"), &region.broker_private, port);
    }

    for other in &region.broker_nodes {
        if !options.include_self && other.name == me.name {
            continue;
        }
        plan.push_ports(&region_label(region, &other.name), &other.host, &ports::BROKER_MEMBER);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topology() -> Topology {
        Topology {
            postgres: "db".to_string(),
            fleet_endpoint: "ccm-lb".to_string(),
            fleet: vec![Node::new("ccm1", "m1"), Node::new("ccm2", "m2")],
            log_collector: "logs".to_string(),
            regions: vec![
                Region {
                    name: "r1".to_string(),
                    service_endpoint: "cco-lb-1".to_string(),
                    service_nodes: vec![Node::new("cco1", "c1"), Node::new("cco2", "c2")],
                    broker_public: "pub1".to_string(),
                    broker_private: "priv1".to_string(),
                    broker_nodes: vec![Node::new("b1", "h1"), Node::new("b2", "h2")],
                },
                Region {
                    name: "r2".to_string(),
                    service_endpoint: "cco-lb-2".to_string(),
                    service_nodes: vec![Node::new("cco3", "c3")],
                    broker_public: "pub2".to_string(),
                    broker_private: "priv2".to_string(),
                    broker_nodes: vec![Node::new("b3", "h3")],
                },
            ],
        }
    }

    fn addresses(checks: &[EndpointCheck]) -> Vec<String> {
        checks.iter().map(EndpointCheck::address).collect()
    }

    fn resolve_default(identity: &str, topology: &Topology) -> Vec<EndpointCheck> {
        resolve_identity(identity, topology, ResolveOptions::default()).unwrap()
    }

    #[test]
    fn test_browser() {
        let checks = resolve_default("browser", &topology());
        assert_eq!(
            addresses(&checks),
            vec!["ccm-lb:443", "logs:8882", "pub1:443", "pub2:443"]
        );
        assert_eq!(checks[2].label, "r1,rabbit-lb-public");
    }

    #[test]
    fn test_worker() {
        let checks = resolve_default("worker", &topology());
        assert_eq!(
            addresses(&checks),
            vec!["pub1:5671", "pub1:7789", "pub2:5671", "pub2:7789"]
        );
    }

    #[test]
    fn test_fleet_member() {
        let checks = resolve_default("ccm1", &topology());
        assert_eq!(
            addresses(&checks),
            vec![
                "db:5432",
                "logs:4560",
                "logs:8881",
                "cco-lb-1:8443",
                "cco-lb-2:8443",
                "m1:22",
                "m2:22",
            ]
        );
    }

    #[test]
    fn test_service_member_only_owning_region() {
        let checks = resolve_default("cco3", &topology());
        assert_eq!(
            addresses(&checks),
            vec![
                "logs:4560",
                "logs:8881",
                "ccm-lb:8443",
                "pub2:5671",
                "priv2:5671",
                "c3:22",
                "c3:5701",
                "c3:27017",
                "c3:8443",
            ]
        );
    }

    #[test]
    fn test_broker_member() {
        let checks = resolve_default("b1", &topology());
        let addrs = addresses(&checks);
        assert_eq!(
            &addrs[..6],
            &["ccm-lb:443", "cco-lb-1:8443", "pub1:7789", "priv1:7789", "pub1:7788", "priv1:7788"]
        );
        assert_eq!(
            &addrs[6..],
            &[
                "h1:7789", "h1:7788", "h1:4369", "h1:25672", "h1:22",
                "h2:7789", "h2:7788", "h2:4369", "h2:25672", "h2:22",
            ]
        );
        assert!(!addrs.iter().any(|a| a.starts_with("h3:") || a.starts_with("pub2")));
        assert_eq!(checks[6].label, "r1,b1");
    }

    #[test]
    fn test_skip_self() {
        let options = ResolveOptions { include_self: false };
        let checks = resolve_identity("b1", &topology(), options).unwrap();
        assert!(!checks.iter().any(|c| c.host == "h1"));
        assert!(checks.iter().any(|c| c.host == "h2"));

        let checks = resolve_identity("ccm2", &topology(), options).unwrap();
        assert!(!checks.iter().any(|c| c.host == "m2"));
        assert!(checks.iter().any(|c| c.host == "m1"));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let t = topology();
        for identity in ["browser", "worker", "ccm1", "cco1", "cco3", "b1", "b3"] {
            assert_eq!(resolve_default(identity, &t), resolve_default(identity, &t));
        }
    }

    #[test]
    fn test_empty_topology_degrades_to_globals() {
        let t = Topology::default();
        assert!(resolve_default("worker", &t).is_empty());
        assert_eq!(resolve_default("browser", &t).len(), 2);
        assert_eq!(resolve_default("ccm1", &t).len(), 3);
    }

    #[test]
    fn test_classification_failure_is_an_error() {
        let t = topology();
        assert!(matches!(
            resolve_identity("rabbit9", &t, ResolveOptions::default()),
            Err(ResolveError::MemberNotFound { .. })
        ));
        assert!(matches!(
            resolve_identity("nobody", &t, ResolveOptions::default()),
            Err(ResolveError::Unrecognized { .. })
        ));
    }

    #[test]
    fn test_ipv6_address_is_bracketed() {
        assert_eq!(EndpointCheck::new("x", "::1", 22).address(), "[::1]:22");
        assert_eq!(EndpointCheck::new("x", "[::1]", 22).address(), "[::1]:22");
        assert_eq!(EndpointCheck::new("x", "host", 22).address(), "host:22");
    }
}
