//! Topology type definitions.
//!
//! These structures mirror the YAML topology document. Key names follow the
//! lower-case spelling used by existing topology files (`ccmendpoint`,
//! `regionlist`, ...). Every field defaults to empty so that a partial
//! document still loads.

use serde::{Deserialize, Serialize};

/// A named host: coordinator-fleet member, coordinator-service member or
/// broker-cluster member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    /// Identity used for role dispatch
    pub name: String,
    /// Bare hostname or address, without a port
    pub host: String,
}

impl Node {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
        }
    }
}

/// A region-scoped sub-topology
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    pub name: String,
    /// Load-balanced coordinator-service endpoint
    #[serde(rename = "ccoendpoint")]
    pub service_endpoint: String,
    #[serde(rename = "ccolist")]
    pub service_nodes: Vec<Node>,
    #[serde(rename = "rabbitendpointpublic")]
    pub broker_public: String,
    #[serde(rename = "rabbitendpointprivate")]
    pub broker_private: String,
    #[serde(rename = "rabbitlist")]
    pub broker_nodes: Vec<Node>,
}

impl Region {
    /// Find a coordinator-service member of this region by exact name
    pub fn service_node(&self, name: &str) -> Option<&Node> {
        self.service_nodes.iter().find(|n| n.name == name)
    }

    /// Find a broker-cluster member of this region by exact name
    pub fn broker_node(&self, name: &str) -> Option<&Node> {
        self.broker_nodes.iter().find(|n| n.name == name)
    }
}

/// The whole infrastructure graph for one verification run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topology {
    /// Shared database used by the coordinator fleet
    pub postgres: String,
    /// Load-balanced coordinator-fleet endpoint
    #[serde(rename = "ccmendpoint")]
    pub fleet_endpoint: String,
    #[serde(rename = "ccmlist")]
    pub fleet: Vec<Node>,
    #[serde(rename = "regionlist")]
    pub regions: Vec<Region>,
    #[serde(rename = "logcollector")]
    pub log_collector: String,
}

impl Topology {
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Find a coordinator-fleet member by exact name
    pub fn fleet_node(&self, name: &str) -> Option<&Node> {
        self.fleet.iter().find(|n| n.name == name)
    }

    /// Locate the region owning the coordinator-service member `name`.
    ///
    /// Regions are searched in topology order and the first match wins.
    pub fn find_service_node(&self, name: &str) -> Option<(&Region, &Node)> {
        self.regions
            .iter()
            .find_map(|r| r.service_node(name).map(|n| (r, n)))
    }

    /// Locate the region owning the broker-cluster member `name`.
    pub fn find_broker_node(&self, name: &str) -> Option<(&Region, &Node)> {
        self.regions
            .iter()
            .find_map(|r| r.broker_node(name).map(|n| (r, n)))
    }
}
