//! Deployer - secrets-aware deployment of environment-scoped Kubernetes resources.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── apply         # Run the deployment pipeline
//! │   ├── encrypt       # Encrypt a file for an environment
//! │   ├── decrypt       # Decrypt a file for an environment
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # .deployer.toml + resolved environment config
//!     ├── store/        # Key file storage
//!     ├── keys          # Key manager (cached key pair + cipher)
//!     ├── cipher/       # Encryption backends (sops)
//!     ├── cluster/      # Cluster backends (kubectl, readiness probes)
//!     └── apply         # Deployment orchestrator
//! ```
//!
//! # Pipeline
//!
//! For `deployer -e staging apply --bootstrap`:
//!
//! 1. Every `k8s/env/staging/**/*.sops` file is decrypted next to itself
//! 2. `k8s/bootstrap` is applied and probed (if it exists)
//! 3. `k8s/env/staging` is applied and probed
//! 4. All decrypted plaintext is deleted, whether or not the steps above succeeded

pub mod cli;
pub mod core;
pub mod error;
