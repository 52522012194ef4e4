//! Network topology module.
//!
//! This module holds the in-memory model of the infrastructure graph:
//! regions, their coordinator-service and broker-cluster fleets, and the
//! shared endpoints used by every role.

pub mod types;
pub mod validation;

// Re-export key types for easier access
pub use types::{Node, Region, Topology};
pub use validation::TopologyError;
