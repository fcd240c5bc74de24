//! kubectl cluster backend.
//!
//! Applies with `kubectl [--context=<name>] apply --wait --kustomize <path>`.
//! Output of kubectl and of readiness probes goes straight to the terminal.
//! A running child is killed when the [`Cancel`] flag is raised.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::Cluster;
use crate::core::cancel::Cancel;
use crate::core::constants::READY_ENV_VAR;
use crate::error::{ClusterError, Error, Result};

/// How often a running child is checked for exit or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// kubectl backend. Commands run from `workdir` so relative resource
/// paths resolve the same way regardless of the caller's cwd.
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: String,
    workdir: PathBuf,
    cancel: Cancel,
}

impl Kubectl {
    pub fn new(program: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            workdir: workdir.into(),
            cancel: Cancel::default(),
        }
    }

    pub fn with_cancel(mut self, cancel: Cancel) -> Self {
        self.cancel = cancel;
        self
    }

    /// Arguments for an apply of `path`.
    pub fn apply_args(path: &Path, context: Option<&str>) -> Vec<String> {
        let mut args = Vec::with_capacity(5);
        if let Some(context) = context {
            args.push(format!("--context={}", context));
        }
        args.extend([
            "apply".to_string(),
            "--wait".to_string(),
            "--kustomize".to_string(),
            path.display().to_string(),
        ]);
        args
    }

    /// Spawn `command` and wait for it, killing it if cancelled first.
    fn run(&self, command: &mut Command, label: &str) -> Result<ExitStatus> {
        self.cancel.check()?;

        let mut child = command.spawn().map_err(|source| ClusterError::Spawn {
            program: label.to_string(),
            source,
        })?;

        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if self.cancel.is_cancelled() {
                warn!("stopping {}", label);
                // already exited between polls if this fails
                let _ = child.kill();
                child.wait()?;
                return Err(Error::Interrupted);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Cluster for Kubectl {
    fn apply(&self, path: &Path, context: Option<&str>) -> Result<()> {
        which::which(&self.program).map_err(|_| ClusterError::ToolNotFound {
            program: self.program.clone(),
        })?;

        let args = Self::apply_args(path, context);
        info!("$ {} {}", self.program, args.join(" "));

        let status = self.run(
            Command::new(&self.program)
                .args(&args)
                .current_dir(&self.workdir),
            &self.program,
        )?;

        if !status.success() {
            return Err(ClusterError::ApplyFailed {
                path: path.to_path_buf(),
                status,
            }
            .into());
        }

        debug!(path = %path.display(), "applied");
        Ok(())
    }

    fn probe(&self, script: &Path, env: &str) -> Result<()> {
        info!("$ {}={} {}", READY_ENV_VAR, env, script.display());

        let program = if script.is_absolute() {
            script.to_path_buf()
        } else {
            self.workdir.join(script)
        };

        let status = self.run(
            Command::new(&program)
                .env(READY_ENV_VAR, env)
                .current_dir(&self.workdir),
            &script.display().to_string(),
        )?;

        if !status.success() {
            return Err(ClusterError::VerifyFailed {
                path: script.to_path_buf(),
                status,
            }
            .into());
        }

        debug!(script = %script.display(), "ready");
        Ok(())
    }
}
