//! sops cipher backend.
//!
//! Runs `sops --encrypt /dev/stdin` / `sops --decrypt /dev/stdin`. Key
//! material travels in environment variables (`SOPS_AGE_RECIPIENTS`,
//! `SOPS_AGE_KEY`), file contents over the pipes; sops never sees the real
//! file path.
//!
//! ## Requirements
//!
//! - `sops` CLI must be installed (or configured via `[tools] sops = ...`)

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::{info, trace};
use zeroize::Zeroizing;

use super::Cipher;
use crate::core::constants::{SOPS_KEY_VAR, SOPS_RECIPIENTS_VAR};
use crate::error::{CipherError, Result};

/// Which way data is flowing through sops.
#[derive(Debug, Clone, Copy)]
enum Mode {
    Encrypt,
    Decrypt,
}

impl Mode {
    fn flag(self) -> &'static str {
        match self {
            Mode::Encrypt => "--encrypt",
            Mode::Decrypt => "--decrypt",
        }
    }

    fn key_var(self) -> &'static str {
        match self {
            Mode::Encrypt => SOPS_RECIPIENTS_VAR,
            Mode::Decrypt => SOPS_KEY_VAR,
        }
    }

    fn error(self, msg: String) -> CipherError {
        match self {
            Mode::Encrypt => CipherError::EncryptionFailed(msg),
            Mode::Decrypt => CipherError::DecryptionFailed(msg),
        }
    }
}

/// sops cipher backend using the sops CLI.
#[derive(Debug, Clone)]
pub struct Sops {
    program: String,
}

impl Sops {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Check that the configured program can be found.
    fn check_sops(&self) -> Result<()> {
        which::which(&self.program).map_err(|_| CipherError::ToolNotFound {
            program: self.program.clone(),
        })?;
        Ok(())
    }

    fn run(&self, mode: Mode, input: &[u8], key: &str) -> Result<Zeroizing<Vec<u8>>> {
        self.check_sops()?;

        info!("$ {} {} /dev/stdin", self.program, mode.flag());

        let mut cmd = Command::new(&self.program);
        cmd.args([mode.flag(), "/dev/stdin"])
            .env(mode.key_var(), key)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| mode.error(format!("failed to spawn {}: {}", self.program, e)))?;

        // stdin is dropped at the end of this block so sops sees EOF. A broken
        // pipe means sops exited early; its exit status carries the real error.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(input) {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(mode
                        .error(format!("failed to write to {}: {}", self.program, e))
                        .into());
                }
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| mode.error(format!("{} command failed: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(mode
                .error(format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                ))
                .into());
        }

        Ok(Zeroizing::new(output.stdout))
    }
}

impl Cipher for Sops {
    fn name(&self) -> &'static str {
        "sops"
    }

    fn encrypt(&self, plaintext: &[u8], recipient: &str) -> Result<Vec<u8>> {
        trace!(plaintext_len = plaintext.len(), "encrypting with sops");
        let ciphertext = self.run(Mode::Encrypt, plaintext, recipient)?;
        trace!(ciphertext_len = ciphertext.len(), "encrypted with sops");
        Ok(ciphertext.to_vec())
    }

    fn decrypt(&self, ciphertext: &[u8], identity: &str) -> Result<Zeroizing<Vec<u8>>> {
        trace!(ciphertext_len = ciphertext.len(), "decrypting with sops");
        let plaintext = self.run(Mode::Decrypt, ciphertext, identity)?;
        trace!(plaintext_len = plaintext.len(), "decrypted with sops");
        Ok(plaintext)
    }
}
