//! Ciphertext/plaintext path pairing.
//!
//! An encrypted file `<path>.sops` always decrypts to its sibling `<path>`.
//! Discovery, decryption and cleanup all go through these helpers.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::core::constants::CIPHER_SUFFIX;

/// Whether `path` names a ciphertext file.
pub fn is_ciphertext(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.len() > CIPHER_SUFFIX.len() && n.ends_with(CIPHER_SUFFIX))
}

/// Plaintext destination for `path`, with the ciphertext suffix stripped if present.
pub fn plaintext_path(path: &Path) -> PathBuf {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) if is_ciphertext(path) => {
            path.with_file_name(&name[..name.len() - CIPHER_SUFFIX.len()])
        }
        _ => path.to_path_buf(),
    }
}

/// Ciphertext location for `path`: `<plaintext>.sops`.
pub fn ciphertext_path(path: &Path) -> PathBuf {
    let mut name: OsString = plaintext_path(path).into_os_string();
    name.push(CIPHER_SUFFIX);
    PathBuf::from(name)
}
