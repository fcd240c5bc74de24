//! Encryption backends.
//!
//! The deployer never implements cryptography itself. A [`Cipher`] turns
//! bytes into ciphertext for a recipient key and back with an identity key;
//! the only production backend is [`Sops`], which shells out to the `sops`
//! CLI and streams data through stdin/stdout.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Cipher` trait
//! 2. Add the implementation in a new file next to `sops.rs`
//! 3. Re-export from this module

use zeroize::Zeroizing;

use crate::error::Result;

mod sops;

pub use sops::Sops;

/// Encryption backend trait.
///
/// Keys are opaque strings exactly as they were read from the identity
/// directory; their interpretation is up to the backend.
pub trait Cipher {
    /// Encrypt `plaintext` for the holder of `recipient`.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::EncryptionFailed` if the backend rejects the input.
    fn encrypt(&self, plaintext: &[u8], recipient: &str) -> Result<Vec<u8>>;

    /// Decrypt `ciphertext` with the private `identity`.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::DecryptionFailed` if the backend cannot decrypt.
    fn decrypt(&self, ciphertext: &[u8], identity: &str) -> Result<Zeroizing<Vec<u8>>>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}
