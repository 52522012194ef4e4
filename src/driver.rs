//! Verification driver.
//!
//! Runs one full verification: classify the identity, resolve its checks,
//! probe every one of them and fold the outcomes into a single verdict.
//! Nothing here returns an error; every failure ends up in the report.

use std::collections::HashSet;

use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::executor::{CheckOutcome, ReachabilityExecutor};
use crate::resolver::{resolve, EndpointCheck, ResolveOptions};
use crate::role::{classify, ResolveError};
use crate::topology::Topology;

/// Upper bound on probe threads when sizing the pool automatically
pub const MAX_AUTO_JOBS: usize = 32;

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    pub resolve: ResolveOptions,
    /// Concurrent probes: 1 runs sequentially, 0 sizes the pool to the
    /// number of distinct destination hosts (capped at [`MAX_AUTO_JOBS`])
    pub jobs: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            resolve: ResolveOptions::default(),
            jobs: 1,
        }
    }
}

/// Overall result of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Verdict {
    /// Every check passed (or there were none)
    Passed,
    /// At least one endpoint could not be reached
    Unreachable { failed: usize },
    /// The identity could not be classified; no checks ran
    Unresolved { reason: ResolveError },
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub identity: String,
    pub verdict: Verdict,
    /// One entry per check, in resolution order
    pub outcomes: Vec<CheckOutcome>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.reachable)
    }
}

pub struct VerificationDriver {
    executor: ReachabilityExecutor,
    config: DriverConfig,
}

impl VerificationDriver {
    pub fn new(executor: ReachabilityExecutor, config: DriverConfig) -> Self {
        Self { executor, config }
    }

    /// Resolve the checks for `identity` without probing anything
    pub fn plan(
        &self,
        identity: &str,
        topology: &Topology,
    ) -> Result<Vec<EndpointCheck>, ResolveError> {
        let role = classify(identity, topology)?;
        debug!("{}: classified as {}", identity, role.category());
        Ok(resolve(&role, topology, self.config.resolve))
    }

    /// Run the full verification for `identity`
    pub fn verify(&self, identity: &str, topology: &Topology) -> VerificationReport {
        let checks = match self.plan(identity, topology) {
            Ok(checks) => checks,
            Err(reason) => {
                error!("{}", reason);
                return VerificationReport {
                    identity: identity.to_string(),
                    verdict: Verdict::Unresolved { reason },
                    outcomes: Vec::new(),
                };
            }
        };

        info!("{}: running {} checks", identity, checks.len());
        let outcomes = self.execute(identity, &checks);

        let failed = outcomes.iter().filter(|o| !o.reachable).count();
        let verdict = if failed == 0 {
            Verdict::Passed
        } else {
            Verdict::Unreachable { failed }
        };

        VerificationReport {
            identity: identity.to_string(),
            verdict,
            outcomes,
        }
    }

    /// Probe every check. Outcomes keep the order of `checks` whatever the
    /// degree of concurrency.
    pub fn execute(&self, location: &str, checks: &[EndpointCheck]) -> Vec<CheckOutcome> {
        let jobs = self.effective_jobs(checks);
        if jobs <= 1 {
            return self.execute_sequential(location, checks);
        }

        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => {
                debug!("{}: probing with {} threads", location, jobs);
                pool.install(|| {
                    checks
                        .par_iter()
                        .map(|check| self.executor.probe(location, check))
                        .collect()
                })
            }
            Err(e) => {
                warn!("Failed to build probe thread pool, running sequentially: {}", e);
                self.execute_sequential(location, checks)
            }
        }
    }

    fn execute_sequential(&self, location: &str, checks: &[EndpointCheck]) -> Vec<CheckOutcome> {
        checks
            .iter()
            .map(|check| self.executor.probe(location, check))
            .collect()
    }

    fn effective_jobs(&self, checks: &[EndpointCheck]) -> usize {
        match self.config.jobs {
            0 => {
                let hosts: HashSet<&str> = checks.iter().map(|c| c.host.as_str()).collect();
                hosts.len().clamp(1, MAX_AUTO_JOBS)
            }
            n => n.min(checks.len().max(1)),
        }
    }
}
