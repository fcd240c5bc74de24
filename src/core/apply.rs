//! Deployment orchestrator.
//!
//! [`Applier`] drives one environment through
//! decrypt → apply bootstrap (optional) → verify → apply environment → verify,
//! and always finishes by deleting every plaintext file it decrypted.
//!
//! ```text
//! Idle ─► Checking ─(no k8s/env/<env>)─► Done (no-op)
//!            │
//!            ▼
//!        Decrypting ─► ApplyingBootstrap? ─► ApplyingEnvironment ─► CleaningUp ─► Done
//!            │                │                      │                  ▲
//!            └────────────────┴──────── error ───────┴──────────────────┘ ─► Failed
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::cancel::Cancel;
use crate::core::cluster::{Cluster, Kubectl};
use crate::core::config::{EnvironmentConfig, MissingEnvPolicy, Tools};
use crate::core::constants::READY_SCRIPT;
use crate::core::keys::KeyOp;
use crate::core::paths;
use crate::error::{CleanupError, ConfigError, Error, Result};

/// How a pipeline run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The environment has no resource directory; nothing was done.
    Skipped,
    /// Resources were applied.
    Applied {
        /// Whether the bootstrap stage ran.
        bootstrap: bool,
        /// Number of secret files decrypted for the run.
        secrets: usize,
    },
}

/// Plaintext artifacts created during the current run, in creation order.
#[derive(Debug, Default)]
pub struct DirtySet {
    paths: Vec<PathBuf>,
}

impl DirtySet {
    pub fn push(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Copy of the pending paths.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }

    /// Take every pending path, leaving the set empty.
    fn drain(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.paths)
    }
}

/// Orchestrates a deployment for one environment.
///
/// Pending plaintext is removed by [`Applier::execute`] on every exit path,
/// including cancellation, and failing that when the applier is dropped.
pub struct Applier {
    config: Arc<EnvironmentConfig>,
    keys: KeyOp,
    cluster: Box<dyn Cluster>,
    cancel: Cancel,
    dirty: DirtySet,
}

impl Applier {
    pub fn new(config: Arc<EnvironmentConfig>, keys: KeyOp, cluster: Box<dyn Cluster>) -> Self {
        Self {
            config,
            keys,
            cluster,
            cancel: Cancel::default(),
            dirty: DirtySet::default(),
        }
    }

    /// Applier backed by sops and kubectl, stopping early once `cancel` is
    /// raised.
    pub fn from_config(config: EnvironmentConfig, tools: &Tools, cancel: Cancel) -> Self {
        let config = Arc::new(config);
        let keys = KeyOp::from_config(Arc::clone(&config), tools);
        let cluster =
            Kubectl::new(tools.kubectl.clone(), config.base_dir()).with_cancel(cancel.clone());
        Self::new(config, keys, Box::new(cluster)).with_cancel(cancel)
    }

    /// Check `cancel` between files and before every stage.
    pub fn with_cancel(mut self, cancel: Cancel) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Plaintext files waiting to be deleted.
    pub fn dirty(&self) -> Vec<PathBuf> {
        self.dirty.snapshot()
    }

    /// Every `*.sops` file under `k8s/env/<env>`, relative to the base
    /// directory, in a stable order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the tree cannot be walked.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let base = self.config.base_dir();
        let root = self.config.resolve(&self.config.env_path());

        let mut found = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() || !paths::is_ciphertext(entry.path()) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(base)
                .unwrap_or(entry.path())
                .to_path_buf();
            found.push(relative);
        }

        debug!(count = found.len(), root = %root.display(), "discovered secrets");
        Ok(found)
    }

    /// Decrypt every discovered secret, recording each plaintext as dirty.
    ///
    /// Files decrypted before a failure stay recorded so cleanup can still
    /// remove them.
    ///
    /// # Errors
    ///
    /// Returns the first key, cipher or I/O error.
    pub fn decrypt(&mut self) -> Result<()> {
        for path in self.discover()? {
            self.cancel.check()?;
            let plaintext = self.keys.decrypt(&path)?;
            self.dirty.push(plaintext);
        }
        Ok(())
    }

    /// Apply the kustomization at `path`, then wait for it to be ready.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError` if the apply or the readiness probe fails.
    pub fn apply_kustomize(&self, path: &Path) -> Result<()> {
        self.cancel.check()?;
        self.cluster.apply(path, self.config.context())?;
        self.verify_kustomize(path)
    }

    /// Run `<path>/apply-ready.sh` if it exists; otherwise the stage is
    /// considered ready immediately.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::VerifyFailed` if the probe exits non-zero.
    pub fn verify_kustomize(&self, path: &Path) -> Result<()> {
        let script = path.join(READY_SCRIPT);
        if !self.config.resolve(&script).is_file() {
            debug!(path = %path.display(), "no readiness probe, continuing");
            return Ok(());
        }

        self.cluster.probe(&script, self.config.env())
    }

    /// Delete every dirty path and empty the set.
    ///
    /// Best effort: a failed delete is logged and reported, and the remaining
    /// paths are still processed. Calling this again is a no-op.
    pub fn cleanup(&mut self) -> Vec<CleanupError> {
        let mut failures = Vec::new();
        for path in self.dirty.drain() {
            info!("deleting {}", path.display());
            if let Err(source) = fs::remove_file(self.config.resolve(&path)) {
                let err = CleanupError { path, source };
                warn!("{}", err);
                failures.push(err);
            }
        }
        failures
    }

    /// Run the whole pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first error from decryption, apply or verification, after
    /// cleanup has run. Returns `Error::Interrupted` if cancelled at any point
    /// during the run, whatever the stage reported. Returns
    /// `ConfigError::EnvironmentNotFound` for a missing environment only
    /// under [`MissingEnvPolicy::Fail`].
    pub fn execute(&mut self) -> Result<Outcome> {
        let env = self.config.env().to_string();
        let env_path = self.config.env_path();

        if !is_readable_dir(&self.config.resolve(&env_path)) {
            return match self.config.missing_env() {
                MissingEnvPolicy::Skip => {
                    info!("no resources for {}!", env);
                    Ok(Outcome::Skipped)
                }
                MissingEnvPolicy::Fail => Err(ConfigError::EnvironmentNotFound(env).into()),
            };
        }

        let result = self.run_stages(&env, &env_path);

        let failures = self.cleanup();
        if !failures.is_empty() {
            warn!(count = failures.len(), "some plaintext files could not be deleted");
        }

        // a signal also reaches children in the same process group, so a
        // stage failure after cancellation is reported as the interruption
        if self.cancel.is_cancelled() {
            return Err(Error::Interrupted);
        }
        result
    }

    fn run_stages(&mut self, env: &str, env_path: &Path) -> Result<Outcome> {
        self.decrypt()?;
        let secrets = self.dirty.len();

        let bootstrap_path = self.config.bootstrap_path();
        let bootstrap =
            self.config.bootstrap() && is_readable_dir(&self.config.resolve(&bootstrap_path));
        if bootstrap {
            info!("apply bootstrap");
            self.apply_kustomize(&bootstrap_path)?;
        } else if self.config.bootstrap() {
            debug!("bootstrap requested but {} is missing", bootstrap_path.display());
        }

        info!("apply {}", env);
        self.apply_kustomize(env_path)?;

        Ok(Outcome::Applied { bootstrap, secrets })
    }
}

impl Drop for Applier {
    fn drop(&mut self) {
        if !self.dirty.is_empty() {
            self.cleanup();
        }
    }
}

fn is_readable_dir(path: &Path) -> bool {
    path.is_dir() && fs::read_dir(path).is_ok()
}
