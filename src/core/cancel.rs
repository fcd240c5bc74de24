//! Cooperative cancellation.
//!
//! SIGINT, SIGTERM and SIGHUP set a shared flag instead of killing the
//! process, so the orchestrator can stop at the next stage boundary and
//! still remove decrypted plaintext. Child processes are killed by the
//! backends that spawned them once the flag is set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::error::{Error, Result};

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct Cancel {
    flag: Arc<AtomicBool>,
}

impl Cancel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route termination signals to this flag.
    ///
    /// Only one handler may be installed per process.
    ///
    /// # Errors
    ///
    /// Returns `Error::Signal` if a handler is already installed or the
    /// platform refuses it.
    pub fn install(&self) -> Result<()> {
        let cancel = self.clone();
        ctrlc::set_handler(move || {
            if !cancel.flag.swap(true, Ordering::SeqCst) {
                warn!("interrupted, cleaning up");
            }
        })?;
        Ok(())
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Error::Interrupted)` once cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }
}
