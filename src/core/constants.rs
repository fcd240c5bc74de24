//! Constants used throughout deployer.
//!
//! Centralizes magic strings and the fixed resource layout.

/// Suffix marking an encrypted secret file.
pub const CIPHER_SUFFIX: &str = ".sops";

/// Optional project settings file, read from the base directory.
pub const CONFIG_FILE: &str = ".deployer.toml";

/// Root of the resource tree, relative to the base directory.
pub const K8S_DIR: &str = "k8s";

/// Bootstrap resources (`k8s/bootstrap`).
pub const BOOTSTRAP_DIR: &str = "bootstrap";

/// Per-environment resources live under `k8s/env/<env>`.
pub const ENV_DIR: &str = "env";

/// Readiness probe looked up inside each applied resource path.
pub const READY_SCRIPT: &str = "apply-ready.sh";

/// Variable carrying the environment name into the readiness probe.
pub const READY_ENV_VAR: &str = "ENV";

/// Private key file extension (`<env>.key`).
pub const PRIVATE_KEY_EXT: &str = ".key";

/// Public key file extension (`<env>.pub.key`).
pub const PUBLIC_KEY_EXT: &str = ".pub.key";

/// Variable handed to sops with the recipient public key when encrypting.
pub const SOPS_RECIPIENTS_VAR: &str = "SOPS_AGE_RECIPIENTS";

/// Variable handed to sops with the private key when decrypting.
pub const SOPS_KEY_VAR: &str = "SOPS_AGE_KEY";

/// Default encryption tool.
pub const DEFAULT_SOPS: &str = "sops";

/// Default cluster tool.
pub const DEFAULT_KUBECTL: &str = "kubectl";
