//! Decrypt command.
//!
//! Hidden: leaves plaintext on disk, which is only wanted when debugging.

use std::path::Path;
use std::sync::Arc;

use crate::cli::{output, GlobalArgs};
use crate::core::keys::KeyOp;
use crate::error::Result;

/// Decrypt `file` (or `<file>.sops`) for the selected environment.
pub fn execute(global: &GlobalArgs, file: &Path) -> Result<()> {
    let (config, tools) = global.load(false)?;
    let mut op = KeyOp::from_config(Arc::new(config), &tools);

    let dst = op.decrypt(file)?;
    output::success(&format!("decrypted {}", output::path(&dst.display().to_string())));
    output::warn("plaintext left on disk; delete it when done");
    Ok(())
}
