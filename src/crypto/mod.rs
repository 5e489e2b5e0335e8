//! Cryptographic functions for gitshield
//!
//! Provides AES-256-CBC encryption with PBKDF2-HMAC-SHA256 key derivation
//! for backup archives, plus the password hashing used by every
//! remote-facing flow.

pub mod encryption;
pub mod key_derivation;
pub mod password;
pub mod secure_memory;

pub use encryption::{decrypt, encrypt, ENVELOPE_HEADER, MIN_ENVELOPE_LEN};
pub use key_derivation::{derive_key, DerivedKey};
pub use password::{decrypt_backup, encrypt_archive, encrypted_file_name, hash_password};
pub use secure_memory::SecureString;
