//! Password hashing (argon2id, PHC string format).

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use once_cell::sync::Lazy;

use crate::AuthError;

/// Hash of a password nobody holds; verified against when the login is unknown.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("medstock-no-such-operator").ok());

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Spend the same argon2 work as `verify_password` for a login that does not exist.
/// Always `false`.
pub fn verify_against_dummy(password: &str) -> bool {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret!", &hash).unwrap());
        assert!(!verify_password("s3cret?", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_a_fresh_salt() {
        assert_ne!(hash_password("pw").unwrap(), hash_password("pw").unwrap());
    }

    #[test]
    fn dummy_verification_never_succeeds() {
        assert!(!verify_against_dummy("medstock-no-such-operator"));
        assert!(!verify_against_dummy(""));
        assert!(DUMMY_HASH.as_deref().is_some_and(|h| h.starts_with("$argon2")));
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify_password("pw", "plaintext").is_err());
    }
}
