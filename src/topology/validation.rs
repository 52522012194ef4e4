//! Uniqueness checks for a loaded topology.
//!
//! A topology that violates these invariants is still usable: lookups
//! resolve to the first matching entry. The loader only logs the result.

use std::collections::HashSet;

use crate::topology::types::{Node, Topology};

/// Topology invariant violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("Duplicate region name: {name}")]
    DuplicateRegion { name: String },

    #[error("Duplicate coordinator-fleet member: {name}")]
    DuplicateFleetNode { name: String },

    #[error("Duplicate coordinator-service member '{name}' in region {region}")]
    DuplicateServiceNode { region: String, name: String },

    #[error("Duplicate broker-cluster member '{name}' in region {region}")]
    DuplicateBrokerNode { region: String, name: String },
}

/// Return the first name that appears twice in `nodes`
fn first_duplicate(nodes: &[Node]) -> Option<&str> {
    let mut seen = HashSet::new();
    nodes
        .iter()
        .map(|n| n.name.as_str())
        .find(|name| !seen.insert(*name))
}

impl Topology {
    /// Check the uniqueness invariants of the topology.
    ///
    /// Checked in document order:
    /// - region names are unique
    /// - coordinator-fleet member names are unique
    /// - within each region, service and broker member names are unique
    pub fn validate(&self) -> Result<(), TopologyError> {
        let mut region_names = HashSet::new();
        for region in &self.regions {
            if !region_names.insert(region.name.as_str()) {
                return Err(TopologyError::DuplicateRegion {
                    name: region.name.clone(),
                });
            }
        }

        if let Some(name) = first_duplicate(&self.fleet) {
            return Err(TopologyError::DuplicateFleetNode {
                name: name.to_string(),
            });
        }

        for region in &self.regions {
            if let Some(name) = first_duplicate(&region.service_nodes) {
                return Err(TopologyError::DuplicateServiceNode {
                    region: region.name.clone(),
                    name: name.to_string(),
                });
            }
            if let Some(name) = first_duplicate(&region.broker_nodes) {
                return Err(TopologyError::DuplicateBrokerNode {
                    region: region.name.clone(),
                    name: name.to_string(),
                });
            }
        }

        Ok(())
    }
}
