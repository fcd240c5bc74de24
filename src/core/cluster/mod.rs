//! Cluster backends.
//!
//! A [`Cluster`] applies a kustomize directory and runs readiness probes.
//! The production backend is [`Kubectl`]; the orchestrator only talks to
//! the trait, so tests substitute a recording fake.

use std::path::Path;

use crate::error::Result;

mod kubectl;

pub use kubectl::Kubectl;

/// Cluster mutation and readiness trait.
pub trait Cluster {
    /// Apply the kustomization at `path` (relative to the base directory).
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::ApplyFailed` if the apply exits non-zero.
    fn apply(&self, path: &Path, context: Option<&str>) -> Result<()>;

    /// Run the readiness probe `script` for `env`.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::VerifyFailed` if the probe exits non-zero.
    fn probe(&self, script: &Path, env: &str) -> Result<()>;
}
