//! Pluggable content cipher used to encrypt a file before it is split, and
//! decrypt it after it is reconstructed.
//!
//! The fragmentation engine only depends on this trait; a concrete
//! implementation (PBKDF2 + AES-256-CBC, matching the reference node) lives
//! in the application crate so the engine itself stays free of a hard
//! dependency on one cipher suite.

use shared::CoreResult;

/// Encrypts/decrypts file content under a password and salt.
///
/// Implementations derive a key from `password` and `salt`; the salt a
/// caller supplies is conventionally the SHA-256 of the filename, so the
/// same password yields a different key per file.
pub trait ContentCipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], password: &str, salt: &[u8]) -> CoreResult<Vec<u8>>;
    fn decrypt(&self, ciphertext: &[u8], password: &str, salt: &[u8]) -> CoreResult<Vec<u8>>;
}
