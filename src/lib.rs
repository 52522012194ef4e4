//! # Reachcheck - network reachability verifier for service topologies
//!
//! Given a role identity and a multi-region topology, reachcheck works out
//! every endpoint that role is required to reach, opens a TCP connection to
//! each, and reports a single pass/fail verdict.
//!
//! ## Overview
//!
//! A topology describes a global coordinator fleet (`ccm`), and per region a
//! coordinator service (`cco`) and a broker cluster (`rabbit`), plus shared
//! endpoints such as the log collector and the database. Each role has a
//! fixed adjacency contract: a broker node must reach its region's
//! coordinator service and every broker peer on the clustering ports, a
//! browser must reach the public load balancers, and so on.
//!
//! ## Architecture
//!
//! - `topology`: the in-memory topology model and its uniqueness checks
//! - `role`: classification of the identity string into a [`role::Role`]
//! - `ports`: the well-known ports every role probes
//! - `resolver`: role + topology to an ordered list of endpoint checks
//! - `executor`: one bounded TCP connect per check, with a mock set
//! - `driver`: runs every check and folds the outcomes into a verdict
//! - `config_loader`: YAML topology loading and dumping
//! - `utils`: timeout parsing
//!
//! ## Example Usage
//!
//! ```rust
//! use reachcheck::config_loader::load_topology_from_reader;
//! use reachcheck::driver::{DriverConfig, VerificationDriver};
//! use reachcheck::executor::{ExecutorConfig, MockSet, ReachabilityExecutor};
//!
//! let yaml = "regionlist:\n  - name: eu\n    rabbitendpointpublic: mq.eu\n";
//! let topology = load_topology_from_reader(yaml.as_bytes())?;
//!
//! let executor = ReachabilityExecutor::new(ExecutorConfig {
//!     mock: MockSet::parse("mq.eu:5671,mq.eu:7789"),
//!     ..Default::default()
//! });
//! let driver = VerificationDriver::new(executor, DriverConfig::default());
//!
//! let report = driver.verify("worker", &topology);
//! assert!(report.passed());
//! assert_eq!(report.outcomes.len(), 2);
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Classification and probe failures are typed `thiserror` errors carried
//! inside the [`driver::VerificationReport`]; a verification run itself
//! never fails. Topology I/O returns `color_eyre` results with context.

pub mod config_loader;
pub mod driver;
pub mod executor;
pub mod ports;
pub mod resolver;
pub mod role;
pub mod topology;
pub mod utils;
