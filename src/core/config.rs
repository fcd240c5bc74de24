//! Configuration loading.
//!
//! Everything the pipeline needs to know about its surroundings is resolved
//! once, up front, into an immutable [`EnvironmentConfig`] plus a [`Tools`]
//! record. The core never consults process-wide state on its own; the CLI
//! collects flags and environment variables into [`Overrides`] and hands them
//! to [`Settings`], which layers them over the optional `.deployer.toml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::constants;
use crate::error::{ConfigError, Result};

/// What to do when `k8s/env/<env>` does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingEnvPolicy {
    /// Report "no resources" and finish successfully.
    #[default]
    Skip,
    /// Treat the missing directory as a configuration error.
    Fail,
}

/// Project settings stored in `.deployer.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub deployer: Meta,
    #[serde(default)]
    pub tools: ToolSettings,
}

/// `[deployer]` section.
#[derive(Debug, Default, Deserialize)]
pub struct Meta {
    /// Directory holding `<env>.key` / `<env>.pub.key`.
    #[serde(default)]
    pub identity_dir: Option<PathBuf>,
    /// Cluster context passed to every apply.
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub missing_env: MissingEnvPolicy,
}

/// `[tools]` section: program overrides for the external backends.
#[derive(Debug, Default, Deserialize)]
pub struct ToolSettings {
    #[serde(default)]
    pub sops: Option<String>,
    #[serde(default)]
    pub kubectl: Option<String>,
}

/// Values supplied on the command line (or via their environment variables).
///
/// Anything set here wins over `.deployer.toml`.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub identity_dir: Option<PathBuf>,
    pub context: Option<String>,
    pub sops: Option<String>,
    pub kubectl: Option<String>,
}

/// Resolved external programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    pub sops: String,
    pub kubectl: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            sops: constants::DEFAULT_SOPS.to_string(),
            kubectl: constants::DEFAULT_KUBECTL.to_string(),
        }
    }
}

impl Settings {
    /// Path of the settings file inside `base_dir`.
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(constants::CONFIG_FILE)
    }

    /// Load `.deployer.toml` from `base_dir`, falling back to defaults when
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` or `ConfigError::Parse` if the file
    /// exists but cannot be read or parsed.
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = Self::path(base_dir);
        if !path.is_file() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        debug!(path = %path.display(), "loading settings");
        let contents = std::fs::read_to_string(&path).map_err(ConfigError::ReadFile)?;
        let settings: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        Ok(settings)
    }

    /// Build the environment configuration for `env`.
    ///
    /// The identity directory defaults to `base_dir` when neither the
    /// overrides nor the settings file name one.
    pub fn environment(
        &self,
        env: &str,
        base_dir: &Path,
        bootstrap: bool,
        overrides: &Overrides,
    ) -> Result<EnvironmentConfig> {
        let identity_dir = overrides
            .identity_dir
            .clone()
            .or_else(|| self.deployer.identity_dir.clone())
            .map(|dir| {
                if dir.is_relative() {
                    base_dir.join(dir)
                } else {
                    dir
                }
            })
            .unwrap_or_else(|| base_dir.to_path_buf());

        let context = overrides
            .context
            .clone()
            .or_else(|| self.deployer.context.clone());

        Ok(EnvironmentConfig::new(env, identity_dir)?
            .with_base_dir(base_dir)
            .with_bootstrap(bootstrap)
            .with_context(context)
            .with_missing_env(self.deployer.missing_env))
    }

    /// Resolve the external program names.
    pub fn tools(&self, overrides: &Overrides) -> Tools {
        let defaults = Tools::default();
        Tools {
            sops: overrides
                .sops
                .clone()
                .or_else(|| self.tools.sops.clone())
                .unwrap_or(defaults.sops),
            kubectl: overrides
                .kubectl
                .clone()
                .or_else(|| self.tools.kubectl.clone())
                .unwrap_or(defaults.kubectl),
        }
    }
}

/// Immutable per-invocation configuration for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    env: String,
    identity_dir: PathBuf,
    bootstrap: bool,
    context: Option<String>,
    base_dir: PathBuf,
    missing_env: MissingEnvPolicy,
}

impl EnvironmentConfig {
    /// Create a configuration for `env`, reading keys from `identity_dir`.
    ///
    /// The base directory defaults to `.`; bootstrap is off.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` if `env` is empty and
    /// `ConfigError::InvalidValue` if it is not a single path component.
    pub fn new(env: impl Into<String>, identity_dir: impl Into<PathBuf>) -> Result<Self> {
        let env = env.into();
        validate_env(&env)?;

        Ok(Self {
            env,
            identity_dir: identity_dir.into(),
            bootstrap: false,
            context: None,
            base_dir: PathBuf::from("."),
            missing_env: MissingEnvPolicy::default(),
        })
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_missing_env(mut self, policy: MissingEnvPolicy) -> Self {
        self.missing_env = policy;
        self
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn identity_dir(&self) -> &Path {
        &self.identity_dir
    }

    pub fn bootstrap(&self) -> bool {
        self.bootstrap
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn missing_env(&self) -> MissingEnvPolicy {
        self.missing_env
    }

    /// `k8s/env/<env>`, relative to the base directory.
    pub fn env_path(&self) -> PathBuf {
        Path::new(constants::K8S_DIR)
            .join(constants::ENV_DIR)
            .join(&self.env)
    }

    /// `k8s/bootstrap`, relative to the base directory.
    pub fn bootstrap_path(&self) -> PathBuf {
        Path::new(constants::K8S_DIR).join(constants::BOOTSTRAP_DIR)
    }

    /// Resolve a base-relative path. Absolute paths pass through.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

fn validate_env(env: &str) -> Result<()> {
    if env.trim().is_empty() {
        return Err(ConfigError::MissingField { field: "env" }.into());
    }

    if env == "." || env == ".." || env.contains(['/', '\\']) {
        return Err(ConfigError::InvalidValue {
            field: "env",
            reason: format!("'{}' is not a plain environment name", env),
        }
        .into());
    }

    Ok(())
}
