//! Command-line interface.

pub mod apply;
pub mod completions;
pub mod decrypt;
pub mod encrypt;
pub mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::cancel::Cancel;
use crate::core::config::{EnvironmentConfig, Overrides, Settings, Tools};
use crate::error::{ConfigError, Result};

/// Deployer - apply environment resources with sops-encrypted secrets.
#[derive(Parser)]
#[command(
    name = "deployer",
    about = "Apply environment-scoped Kubernetes resources with encrypted secrets",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// The environment to operate on
    #[arg(short, long, global = true, env = "DEPLOYER_ENV")]
    pub env: Option<String>,

    /// Directory containing identities (public/private keys)
    #[arg(short = 'I', long, global = true, env = "DEPLOYER_IDENTITY_DIR")]
    pub identity_dir: Option<PathBuf>,

    /// Cluster context to apply against
    #[arg(long, global = true, env = "DEPLOYER_CONTEXT")]
    pub context: Option<String>,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<PathBuf>,

    /// sops program to run
    #[arg(long, global = true, env = "DEPLOYER_SOPS", hide = true)]
    pub sops: Option<String>,

    /// kubectl program to run
    #[arg(long, global = true, env = "DEPLOYER_KUBECTL", hide = true)]
    pub kubectl: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = LogFormat::Text,
        env = "DEPLOYER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,
}

/// Log line format.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Apply resources for the given environment
    Apply {
        /// Also apply bootstrap resources first
        #[arg(short, long)]
        bootstrap: bool,
    },

    /// Encrypt a data file for the given environment
    Encrypt {
        /// Plaintext file; ciphertext is written to <file>.sops
        file: PathBuf,
    },

    /// Decrypt a data file for the given environment
    #[command(hide = true)]
    Decrypt {
        /// Encrypted file (with or without the .sops suffix)
        file: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

impl GlobalArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            identity_dir: self.identity_dir.clone(),
            context: self.context.clone(),
            sops: self.sops.clone(),
            kubectl: self.kubectl.clone(),
        }
    }

    fn base_dir(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        Ok(match &self.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
            None => cwd,
        })
    }

    /// Resolve the environment configuration and tools for a command.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no environment was given or the settings
    /// file is invalid.
    pub fn load(&self, bootstrap: bool) -> Result<(EnvironmentConfig, Tools)> {
        let env = self
            .env
            .as_deref()
            .ok_or(ConfigError::MissingField { field: "env" })?;

        let base_dir = self.base_dir()?;
        let settings = Settings::load(&base_dir)?;
        let overrides = self.overrides();

        let config = settings.environment(env, &base_dir, bootstrap, &overrides)?;
        Ok((config, settings.tools(&overrides)))
    }
}

/// Execute a command. `cancel` is raised by termination signals.
pub fn execute(cli: Cli, cancel: &Cancel) -> Result<()> {
    let Cli { global, command } = cli;

    match command {
        Command::Apply { bootstrap } => apply::execute(&global, bootstrap, cancel),
        Command::Encrypt { file } => encrypt::execute(&global, &file),
        Command::Decrypt { file } => decrypt::execute(&global, &file),
        Command::Completions { shell } => completions::execute(shell),
    }
}
