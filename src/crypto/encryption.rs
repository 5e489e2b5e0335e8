//! AES-256-CBC envelope encryption/decryption
//!
//! Envelope layout: `"Salted__" || salt (8) || iv (16) || ciphertext`.
//! Salt and IV are drawn fresh for every call, so encrypting the same
//! plaintext twice never yields the same envelope.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};

use crate::error::{ShieldError, ShieldResult};

use super::key_derivation::derive_key;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Fixed marker at the start of every envelope
pub const ENVELOPE_HEADER: &[u8; 8] = b"Salted__";

const SALT_LEN: usize = 8;
const IV_LEN: usize = 16;

/// Smallest frame `decrypt` will look at
pub const MIN_ENVELOPE_LEN: usize = ENVELOPE_HEADER.len() + SALT_LEN + IV_LEN;

/// Encrypt plaintext with a password-derived key
pub fn encrypt(plaintext: &[u8], password: &str) -> ShieldResult<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut iv);

    let key = derive_key(password, &salt);
    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| ShieldError::Encryption(format!("Failed to create cipher: {}", e)))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut envelope = Vec::with_capacity(MIN_ENVELOPE_LEN + ciphertext.len());
    envelope.extend_from_slice(ENVELOPE_HEADER);
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&iv);
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Decrypt an envelope produced by [`encrypt`]
pub fn decrypt(envelope: &[u8], password: &str) -> ShieldResult<Vec<u8>> {
    if envelope.len() < MIN_ENVELOPE_LEN {
        return Err(ShieldError::Decryption(format!(
            "Envelope too short: expected at least {} bytes, got {}",
            MIN_ENVELOPE_LEN,
            envelope.len()
        )));
    }

    let (header, rest) = envelope.split_at(ENVELOPE_HEADER.len());
    if header != ENVELOPE_HEADER {
        return Err(ShieldError::Decryption(
            "Envelope header does not match".to_string(),
        ));
    }

    let (salt, rest) = rest.split_at(SALT_LEN);
    let (iv, ciphertext) = rest.split_at(IV_LEN);

    let key = derive_key(password, salt);
    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| ShieldError::Decryption(format!("Failed to create cipher: {}", e)))?;

    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| {
            ShieldError::Decryption("invalid password or corrupted data".to_string())
        })
}
