//! Role identity classification.
//!
//! The identity string given on the command line is turned into a [`Role`]
//! exactly once. Exact node-name matches are tried first, so nodes do not
//! have to follow the `ccm`/`cco`/`rabbit` naming convention. The prefix
//! convention is only a fallback for identities with no exact match.

use std::fmt;

use serde::Serialize;

use crate::topology::{Node, Region, Topology};

/// Identity of the generic external client
pub const BROWSER: &str = "browser";

/// Identity of the generic internal client
pub const WORKER: &str = "worker";

/// Naming-convention prefixes for each member category
pub const FLEET_PREFIX: &str = "ccm";
pub const SERVICE_PREFIX: &str = "cco";
pub const BROKER_PREFIX: &str = "rabbit";

/// Member category of a named node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberKind {
    CoordinatorFleet,
    CoordinatorService,
    BrokerCluster,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemberKind::CoordinatorFleet => "ccm",
            MemberKind::CoordinatorService => "cco",
            MemberKind::BrokerCluster => "rabbit",
        };
        f.write_str(s)
    }
}

/// A classified role identity, borrowing from the topology it was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role<'a> {
    Browser,
    Worker,
    /// A coordinator-fleet member. The fleet checks do not depend on which
    /// member is asking, so the node itself may be absent from `ccmlist`.
    FleetMember { name: &'a str },
    ServiceMember { region: &'a Region, node: &'a Node },
    BrokerMember { region: &'a Region, node: &'a Node },
}

impl Role<'_> {
    /// Short category name used in logs
    pub fn category(&self) -> &'static str {
        match self {
            Role::Browser => BROWSER,
            Role::Worker => WORKER,
            Role::FleetMember { .. } => "coordinator-fleet member",
            Role::ServiceMember { .. } => "coordinator-service member",
            Role::BrokerMember { .. } => "broker-cluster member",
        }
    }
}

/// Classification failures. Both are fatal to a verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "error", rename_all = "kebab-case")]
pub enum ResolveError {
    #[error("bad location: {identity}")]
    Unrecognized { identity: String },

    #[error("could not find this {kind}: {name}")]
    MemberNotFound { kind: MemberKind, name: String },
}

/// Classify `identity` against `topology`.
///
/// Resolution order:
/// 1. the literal `browser` and `worker` identities
/// 2. an exact fleet member name, then an exact service or broker member
///    name in any region (first region in topology order wins)
/// 3. the naming-convention prefixes: `ccm*` is a fleet member, `cco*` and
///    `rabbit*` with no exact match are [`ResolveError::MemberNotFound`]
/// 4. anything else is [`ResolveError::Unrecognized`]
pub fn classify<'a>(
    identity: &'a str,
    topology: &'a Topology,
) -> Result<Role<'a>, ResolveError> {
    match identity {
        BROWSER => return Ok(Role::Browser),
        WORKER => return Ok(Role::Worker),
        _ => {}
    }

    if let Some(node) = topology.fleet_node(identity) {
        return Ok(Role::FleetMember { name: &node.name });
    }
    if let Some((region, node)) = topology.find_service_node(identity) {
        return Ok(Role::ServiceMember { region, node });
    }
    if let Some((region, node)) = topology.find_broker_node(identity) {
        return Ok(Role::BrokerMember { region, node });
    }

    if identity.starts_with(FLEET_PREFIX) {
        return Ok(Role::FleetMember { name: identity });
    }

    let kind = if identity.starts_with(SERVICE_PREFIX) {
        MemberKind::CoordinatorService
    } else if identity.starts_with(BROKER_PREFIX) {
        MemberKind::BrokerCluster
    } else {
        return Err(ResolveError::Unrecognized {
            identity: identity.to_string(),
        });
    };

    Err(ResolveError::MemberNotFound {
        kind,
        name: identity.to_string(),
    })
}
