//! # Credential Crypto
//!
//! Password hashing (Argon2id, PHC strings) and one-time code generation.
//! Every comparison against a stored secret in this module is constant-time.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;
use std::sync::OnceLock;
use subtle::ConstantTimeEq;

use super::errors::{AuthError, AuthResult};

/// Number of digits in a one-time code
pub const OTP_DIGITS: usize = 6;

// ==================
// Password Hashing
// ==================

/// Hash a password into an Argon2id PHC string with a fresh random salt
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Crypto(format!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string
///
/// Returns `Ok(false)` for a mismatch; `Err` is reserved for hashes that
/// cannot be parsed at all (corrupted store).
pub fn verify_password(password: &str, stored_hash: &str) -> AuthResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::Crypto(format!("Stored password hash is malformed: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Burn one Argon2 verification against a throwaway hash.
///
/// Called on login when no account matches the email, so that the
/// unknown-email path costs the same as the wrong-password path.
pub fn equalize_missing_account(password: &str) {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    let dummy = DUMMY_HASH.get_or_init(|| {
        hash_password("postern-dummy-password").unwrap_or_else(|_| String::new())
    });
    let _ = verify_password(password, dummy);
}

// ==================
// One-Time Codes
// ==================

/// Generate a six-digit one-time code, uniform over 000000..=999999
pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:0>width$}", code, width = OTP_DIGITS)
}

/// Constant-time equality for one-time codes
pub fn codes_match(expected: &str, submitted: &str) -> bool {
    expected.as_bytes().ct_eq(submitted.as_bytes()).into()
}
