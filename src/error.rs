//! Error types.
//!
//! Each concern has its own error enum; all of them convert into the
//! top-level [`Error`] so call sites can use `?` freely.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("interrupted")]
    Interrupted,

    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// Configuration errors. Always fatal, raised before any stage runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no resources for environment '{0}'")]
    EnvironmentNotFound(String),
}

/// Key material could not be loaded.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("key file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read key file {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Encryption backend failures.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("{program} not found on PATH")]
    ToolNotFound { program: String },
}

/// Cluster apply and readiness failures.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("apply failed for {} ({status})", path.display())]
    ApplyFailed { path: PathBuf, status: ExitStatus },

    #[error("readiness check failed for {} ({status})", path.display())]
    VerifyFailed { path: PathBuf, status: ExitStatus },

    #[error("{program} not found on PATH")]
    ToolNotFound { program: String },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// A plaintext artifact that could not be removed.
///
/// Never propagated: cleanup reports these and carries on.
#[derive(Error, Debug)]
#[error("failed to delete {}: {source}", path.display())]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
