//! Encrypt command.

use std::path::Path;
use std::sync::Arc;

use crate::cli::{output, GlobalArgs};
use crate::core::keys::KeyOp;
use crate::error::Result;

/// Encrypt `file` into `<file>.sops` for the selected environment.
pub fn execute(global: &GlobalArgs, file: &Path) -> Result<()> {
    let (config, tools) = global.load(false)?;
    let mut op = KeyOp::from_config(Arc::new(config), &tools);

    let dst = op.encrypt(file)?;
    output::success(&format!("encrypted {}", output::path(&dst.display().to_string())));
    Ok(())
}
