//! Filesystem-based key storage.
//!
//! Reads key files from a single identity directory:
//! `<dir>/<env>.key` (private) and `<dir>/<env>.pub.key` (public).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::{KeyKind, Store};
use crate::core::constants::{PRIVATE_KEY_EXT, PUBLIC_KEY_EXT};
use crate::error::{KeyError, Result};

/// Warn when a private key file is readable by group or others (Unix only).
#[cfg(unix)]
fn check_private_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode),
                "private key is accessible by other users; run: chmod 600 {}",
                path.display()
            );
        }
    }
}

#[cfg(not(unix))]
fn check_private_permissions(_path: &Path) {}

/// Filesystem key storage rooted at an identity directory.
#[derive(Debug, Clone)]
pub struct Filesystem {
    dir: PathBuf,
}

impl Filesystem {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the key file for `env`.
    pub fn key_path(&self, env: &str, kind: KeyKind) -> PathBuf {
        let ext = match kind {
            KeyKind::Private => PRIVATE_KEY_EXT,
            KeyKind::Public => PUBLIC_KEY_EXT,
        };
        self.dir.join(format!("{}{}", env, ext))
    }
}

impl Store for Filesystem {
    fn load(&self, env: &str, kind: KeyKind) -> Result<Zeroizing<String>> {
        let path = self.key_path(env, kind);
        debug!(path = %path.display(), %kind, "reading key file");

        if !path.is_file() {
            return Err(KeyError::NotFound(path).into());
        }

        if kind == KeyKind::Private {
            check_private_permissions(&path);
        }

        let contents = Zeroizing::new(
            fs::read_to_string(&path).map_err(|source| KeyError::ReadFailed {
                path: path.clone(),
                source,
            })?,
        );

        Ok(Zeroizing::new(contents.trim().to_string()))
    }
}
