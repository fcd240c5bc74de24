//! Apply command.
//!
//! Runs the full decrypt → apply → verify → cleanup pipeline.

use tracing::debug;

use crate::cli::{output, GlobalArgs};
use crate::core::apply::{Applier, Outcome};
use crate::core::cancel::Cancel;
use crate::error::Result;

/// Apply resources for the selected environment.
pub fn execute(global: &GlobalArgs, bootstrap: bool, cancel: &Cancel) -> Result<()> {
    let (config, tools) = global.load(bootstrap)?;
    debug!(?config, ?tools, "resolved configuration");

    let env = config.env().to_string();
    let mut applier = Applier::from_config(config, &tools, cancel.clone());

    match applier.execute()? {
        Outcome::Skipped => {
            output::dimmed(&format!("nothing to apply for {}", env));
        }
        Outcome::Applied { bootstrap, secrets } => {
            let stages = if bootstrap { "bootstrap + " } else { "" };
            output::success(&format!(
                "applied {}{} ({} secret{} decrypted and removed)",
                stages,
                env,
                secrets,
                if secrets == 1 { "" } else { "s" }
            ));
        }
    }

    Ok(())
}
