//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::{Child, Output, Stdio};

impl Test {
    /// Create a deployer command wired to the fake tools.
    ///
    /// Returns a Command configured with:
    /// - current directory and identity directory set to the project
    /// - DEPLOYER_SOPS / DEPLOYER_KUBECTL pointing at the fakes
    /// - any inherited DEPLOYER_* configuration removed
    pub fn cmd(&self) -> Command {
        Command::from_std(self.std_cmd())
    }

    /// Same as [`Test::cmd`], as a plain process command for tests that need
    /// the running child.
    pub fn std_cmd(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_deployer"));
        for var in [
            "DEPLOYER_ENV",
            "DEPLOYER_IDENTITY_DIR",
            "DEPLOYER_CONTEXT",
            "DEPLOYER_LOG",
            "DEPLOYER_LOG_FORMAT",
            "FAIL_APPLY",
            "SLOW_APPLY",
        ] {
            cmd.env_remove(var);
        }
        cmd.env("NO_COLOR", "1");
        cmd.env("DEPLOYER_SOPS", self.sops_path());
        cmd.env("DEPLOYER_KUBECTL", self.kubectl_path());
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `deployer -e <env> apply`.
    pub fn apply(&self, env: &str) -> Output {
        self.cmd()
            .args(["-e", env, "apply"])
            .output()
            .expect("failed to run deployer apply")
    }

    /// Start `deployer -e <env> apply` with kubectl hanging for `seconds`.
    pub fn spawn_slow_apply(&self, env: &str, seconds: u32) -> Child {
        self.std_cmd()
            .env("SLOW_APPLY", seconds.to_string())
            .args(["-e", env, "apply"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn deployer apply")
    }

    /// Shortcut for `deployer -e <env> apply --bootstrap`.
    pub fn apply_bootstrap(&self, env: &str) -> Output {
        self.cmd()
            .args(["-e", env, "apply", "--bootstrap"])
            .output()
            .expect("failed to run deployer apply --bootstrap")
    }

    /// Shortcut for `deployer -e <env> encrypt <file>`.
    pub fn encrypt(&self, env: &str, file: &str) -> Output {
        self.cmd()
            .args(["-e", env, "encrypt", file])
            .output()
            .expect("failed to run deployer encrypt")
    }

    /// Shortcut for `deployer -e <env> decrypt <file>`.
    pub fn decrypt(&self, env: &str, file: &str) -> Output {
        self.cmd()
            .args(["-e", env, "decrypt", file])
            .output()
            .expect("failed to run deployer decrypt")
    }
}
