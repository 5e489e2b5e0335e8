//! Archive-level encryption helpers
//!
//! Every remote-facing flow runs the user's password through
//! [`hash_password`] before deriving a key from it, so the value used as
//! the encryption password is never the literal secret. Mixing these
//! helpers with the raw [`encrypt`]/[`decrypt`] primitives produces
//! envelopes the other side cannot open.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{ShieldError, ShieldResult};

use super::encryption::{decrypt, encrypt};

/// Hash a password to lowercase hex SHA-256
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Read an archive from disk and encrypt it with the hashed password
pub fn encrypt_archive(file_path: &Path, password: &str) -> ShieldResult<Vec<u8>> {
    let contents = fs::read(file_path).map_err(|e| {
        ShieldError::Io(format!(
            "Failed to read archive {}: {}",
            file_path.display(),
            e
        ))
    })?;

    encrypt(&contents, &hash_password(password))
}

/// Decrypt a downloaded backup envelope with the hashed password
pub fn decrypt_backup(envelope: &[u8], password: &str) -> ShieldResult<Vec<u8>> {
    decrypt(envelope, &hash_password(password))
}

/// Archive file name for a repository slug (`owner/repo`)
///
/// The password does not influence the name; it is accepted so callers
/// can treat name and key derivation symmetrically.
pub fn encrypted_file_name(repository: &str, _password: &str) -> String {
    let repo_name = repository
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("repository");
    format!("{}.tar.zst.enc", repo_name)
}
