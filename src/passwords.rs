use aes_gcm::aead::OsRng;
use argon2::{
    password_hash::{PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};

use crate::errors::{CrmError, CrmResult};

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> CrmResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CrmError::crypto(format!("argon2 hash failed: {e}")))
}

/// False on mismatch; an error only when the stored hash is malformed.
pub fn verify_password(password: &str, stored_hash: &str) -> CrmResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| CrmError::crypto(format!("stored password hash unreadable: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn check_strength(password: &str) -> CrmResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CrmError::validation(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if password.trim().is_empty() {
        return Err(CrmError::validation("password", "must not be blank"));
    }
    Ok(())
}
