//! Key material storage.
//!
//! A [`Store`] hands out the raw key halves for an environment. The only
//! production backend is [`Filesystem`], which reads `<env>.key` and
//! `<env>.pub.key` from the identity directory.
//!
//! ## Adding a New Storage Backend
//!
//! 1. Implement the `Store` trait
//! 2. Add the implementation in a new file (e.g., `vault.rs`)
//! 3. Re-export from this module

use std::fmt;

use zeroize::Zeroizing;

use crate::error::Result;

mod fs;

pub use fs::Filesystem;

/// Which half of a key pair is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Public,
    Private,
}

impl KeyKind {
    /// Cache key segment (`public` / `private`).
    pub fn as_str(self) -> &'static str {
        match self {
            KeyKind::Public => "public",
            KeyKind::Private => "private",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key storage trait.
pub trait Store {
    /// Load one half of the key pair for `env`.
    ///
    /// # Errors
    ///
    /// Returns `KeyError` if the key does not exist or cannot be read.
    fn load(&self, env: &str, kind: KeyKind) -> Result<Zeroizing<String>>;
}
