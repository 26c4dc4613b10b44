//! Argon2id password hashing with a per-password random salt.
//!
//! Parameters are the `argon2` crate defaults and are encoded in each PHC
//! string, so hashes stay verifiable if the defaults change.

use argon2::{
    password_hash::{self, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use rand::rngs::OsRng;

use super::errors::UserError;

pub fn hash_password(plain: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| UserError::HashError(e.to_string()))?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
pub fn verify_password(plain: &str, stored_hash: &str) -> Result<bool, UserError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| UserError::HashError(e.to_string()))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(UserError::HashError(e.to_string())),
    }
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(plain: String) -> Result<String, UserError> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| UserError::HashError(e.to_string()))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(
    plain: String,
    stored_hash: String,
) -> Result<bool, UserError> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &stored_hash))
        .await
        .map_err(|e| UserError::HashError(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifiable() {
        let a = hash_password("pw1").unwrap();
        let b = hash_password("pw1").unwrap();
        assert_ne!(a, "pw1");
        assert_ne!(a, b);
        assert!(verify_password("pw1", &a).unwrap());
        assert!(verify_password("pw1", &b).unwrap());
    }

    #[test]
    fn wrong_password_and_hash_itself_do_not_verify() {
        let h = hash_password("pw1").unwrap();
        assert!(!verify_password("wrong", &h).unwrap());
        assert!(!verify_password("", &h).unwrap());
        assert!(!verify_password(&h, &h).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(matches!(verify_password("pw1", "not-a-phc-string"), Err(UserError::HashError(_))));
    }
}
