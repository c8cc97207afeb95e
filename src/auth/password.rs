//! Password Hashing
//! Mission: One-way salted hashing of credentials with bcrypt

use anyhow::{Context, Result};
use bcrypt::{hash, verify};

/// Fixed bcrypt work factor for every stored credential.
pub const HASH_COST: u32 = 10;

/// Hash a plaintext password.
pub fn hash_password(password: &str) -> Result<String> {
    hash(password, HASH_COST).context("Failed to hash password")
}

/// Check a plaintext password against a stored hash.
///
/// A mismatch is `Ok(false)`. Only a stored value that is not a bcrypt hash
/// is an error.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    verify(password, password_hash).context("Failed to verify password")
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_async(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task failed")?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_async(password: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .context("Password verification task failed")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let digest = hash_password("correct").unwrap();

        assert!(digest.starts_with("$2"));
        assert_ne!(digest, "correct");
        assert!(verify_password("correct", &digest).unwrap());
        assert!(!verify_password("incorrect", &digest).unwrap());
    }

    #[test]
    fn test_uses_fixed_cost() {
        let digest = hash_password("Password1!").unwrap();
        let parts: bcrypt::HashParts = digest.parse().unwrap();
        assert_eq!(parts.get_cost(), HASH_COST);
    }

    #[test]
    fn test_salted_hashes_differ() {
        let first = hash_password("Password1!").unwrap();
        let second = hash_password("Password1!").unwrap();

        assert_ne!(first, second);
        assert!(verify_password("Password1!", &first).unwrap());
        assert!(verify_password("Password1!", &second).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("anything", "not-a-bcrypt-hash").is_err());
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let digest = hash_password_async("Async#Pass1".to_string()).await.unwrap();
        assert!(verify_password_async("Async#Pass1".to_string(), digest.clone())
            .await
            .unwrap());
        assert!(!verify_password_async("wrong".to_string(), digest).await.unwrap());
    }
}
