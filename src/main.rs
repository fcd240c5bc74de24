//! Deployer - secrets-aware deployment of environment-scoped resources.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deployer::cli::output;
use deployer::cli::{execute, Cli, LogFormat};
use deployer::core::cancel::Cancel;
use deployer::error::{CipherError, ClusterError, ConfigError, Error, KeyError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("DEPLOYER_LOG").unwrap_or_else(|_| {
        if cli.global.verbose {
            EnvFilter::new("deployer=debug")
        } else {
            EnvFilter::new("deployer=info")
        }
    });

    let layer = fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    match cli.global.log_format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init(),
    }

    // Signals only raise the flag; the pipeline stops at the next boundary
    // and removes its plaintext before exiting.
    let cancel = Cancel::new();
    let result = cancel.install().and_then(|()| execute(cli, &cancel));

    if let Err(e) = result {
        let suggestion = match &e {
            Error::Config(ConfigError::MissingField { field: "env" }) => {
                Some("pass --env <name> or set DEPLOYER_ENV")
            }
            Error::Key(KeyError::NotFound(_)) => {
                Some("pass --identity-dir or set DEPLOYER_IDENTITY_DIR")
            }
            Error::Cipher(CipherError::ToolNotFound { .. }) => {
                Some("install sops or set DEPLOYER_SOPS")
            }
            Error::Cluster(ClusterError::ToolNotFound { .. }) => {
                Some("install kubectl or set DEPLOYER_KUBECTL")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        let code = if matches!(e, Error::Interrupted) { 130 } else { 1 };
        std::process::exit(code);
    }
}
