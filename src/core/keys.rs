//! Key manager.
//!
//! [`KeyOp`] binds one environment's key pair to a cipher backend. Key halves
//! are loaded lazily and cached under `<env>/<public|private>` for the
//! lifetime of the instance, so a pipeline that decrypts many files reads each
//! key file at most once.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::core::cipher::{Cipher, Sops};
use crate::core::config::{EnvironmentConfig, Tools};
use crate::core::constants::CIPHER_SUFFIX;
use crate::core::paths;
use crate::core::store::{Filesystem, KeyKind, Store};
use crate::error::{CipherError, Result};

/// Encrypts and decrypts files for a single environment.
pub struct KeyOp {
    config: Arc<EnvironmentConfig>,
    store: Box<dyn Store>,
    cipher: Box<dyn Cipher>,
    cache: HashMap<String, Zeroizing<String>>,
}

impl KeyOp {
    pub fn new(
        config: Arc<EnvironmentConfig>,
        store: Box<dyn Store>,
        cipher: Box<dyn Cipher>,
    ) -> Self {
        Self {
            config,
            store,
            cipher,
            cache: HashMap::new(),
        }
    }

    /// Key manager backed by the identity directory and the sops CLI.
    pub fn from_config(config: Arc<EnvironmentConfig>, tools: &Tools) -> Self {
        let store = Filesystem::new(config.identity_dir());
        let cipher = Sops::new(tools.sops.clone());
        Self::new(config, Box::new(store), Box::new(cipher))
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Public key for the configured environment.
    ///
    /// # Errors
    ///
    /// Returns `KeyError` if the key file is missing or unreadable.
    pub fn get_public_key(&mut self) -> Result<Zeroizing<String>> {
        self.get_key(KeyKind::Public)
    }

    /// Private key for the configured environment.
    ///
    /// # Errors
    ///
    /// Returns `KeyError` if the key file is missing or unreadable.
    pub fn get_private_key(&mut self) -> Result<Zeroizing<String>> {
        self.get_key(KeyKind::Private)
    }

    fn get_key(&mut self, kind: KeyKind) -> Result<Zeroizing<String>> {
        let env = self.config.env();
        let cache_key = format!("{}/{}", env, kind);

        if let Some(value) = self.cache.get(&cache_key) {
            debug!(key = %cache_key, "key cache hit");
            return Ok(value.clone());
        }

        info!("loading {} {} key", env, kind);
        let value = self.store.load(env, kind)?;
        self.cache.insert(cache_key, value.clone());
        Ok(value)
    }

    /// Encrypt `path` into `<path>.sops` and return the destination.
    ///
    /// The plaintext is left in place. Relative paths are taken from the
    /// configured base directory; the returned path keeps the caller's form.
    ///
    /// # Errors
    ///
    /// Returns `KeyError` if the public key cannot be loaded and
    /// `CipherError::EncryptionFailed` if reading, encrypting or writing fails.
    pub fn encrypt(&mut self, path: &Path) -> Result<PathBuf> {
        let public_key = self.get_public_key()?;

        let src = path.to_path_buf();
        let mut dst: OsString = src.clone().into_os_string();
        dst.push(CIPHER_SUFFIX);
        let dst = PathBuf::from(dst);

        info!("encrypting {} for {}", src.display(), self.config.env());

        let plaintext = Zeroizing::new(fs::read(self.config.resolve(&src)).map_err(|e| {
            CipherError::EncryptionFailed(format!("failed to read {}: {}", src.display(), e))
        })?);
        let ciphertext = self.cipher.encrypt(&plaintext, &public_key)?;

        write_atomic(&self.config.resolve(&dst), &ciphertext, false).map_err(|e| {
            CipherError::EncryptionFailed(format!("failed to write {}: {}", dst.display(), e))
        })?;

        debug!(cipher = self.cipher.name(), dst = %dst.display(), "encrypted");
        Ok(dst)
    }

    /// Decrypt `<path>.sops` into `<path>` and return the plaintext path.
    ///
    /// `path` may name either side of the pair; `secrets.env.sops` and
    /// `secrets.env` both decrypt `secrets.env.sops` into `secrets.env`.
    ///
    /// # Errors
    ///
    /// Returns `KeyError` if the private key cannot be loaded and
    /// `CipherError::DecryptionFailed` if reading, decrypting or writing fails.
    pub fn decrypt(&mut self, path: &Path) -> Result<PathBuf> {
        let private_key = self.get_private_key()?;

        let dst = paths::plaintext_path(path);
        let src = paths::ciphertext_path(path);

        info!("decrypting {} for {}", dst.display(), self.config.env());

        let ciphertext = fs::read(self.config.resolve(&src)).map_err(|e| {
            CipherError::DecryptionFailed(format!("failed to read {}: {}", src.display(), e))
        })?;
        let plaintext = self.cipher.decrypt(&ciphertext, &private_key)?;

        write_atomic(&self.config.resolve(&dst), &plaintext, true).map_err(|e| {
            CipherError::DecryptionFailed(format!("failed to write {}: {}", dst.display(), e))
        })?;

        debug!(cipher = self.cipher.name(), dst = %dst.display(), "decrypted");
        Ok(dst)
    }
}

/// Write `contents` to a sibling temp file, then rename it over `path`, so
/// an interrupted write never leaves a truncated file at `path`.
fn write_atomic(path: &Path, contents: &[u8], private: bool) -> std::io::Result<()> {
    let mut tmp_name = OsString::from(".");
    tmp_name.push(path.file_name().unwrap_or_default());
    tmp_name.push(".partial");
    let tmp = path.with_file_name(tmp_name);

    let result = (|| {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            if private {
                options.mode(0o600);
            }
        }
        #[cfg(not(unix))]
        let _ = private;

        let mut file = options.open(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
