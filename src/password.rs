// ABOUTME: Password hashing with salted Argon2id and session token generation
// ABOUTME: Verification parses the stored PHC string rather than comparing digests

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core},
};
use rand::{RngCore, rngs::OsRng};

use crate::error::{AppError, Result};

const TOKEN_SIZE: usize = 32; // 256 bits, hex-encoded to 64 chars

/// Hashes a plaintext password with a fresh random salt. The output is a
/// PHC-format string holding the salt and parameters alongside the digest,
/// so identical passwords produce distinct stored values.
pub fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand_core::OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Checks a plaintext password against a stored hash. A mismatch is
/// `Ok(false)`; only a malformed stored hash is an error.
pub fn verify_password(plaintext: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| AppError::Internal(format!("Malformed stored password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok())
}

/// Generates an opaque session token. The token is returned to the caller
/// and never persisted; no endpoint validates it.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_SIZE];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
