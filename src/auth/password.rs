use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed")]
    Hash,
    #[error("stored password hash is malformed")]
    MalformedHash,
}

fn hash_password_sync(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            PasswordError::Hash
        })?
        .to_string();
    Ok(hash)
}

/// A malformed stored hash is reported as its own error so callers can
/// fail closed instead of treating it like a merely-wrong password.
fn verify_password_sync(plain: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        PasswordError::MalformedHash
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Argon2 is deliberately slow; run it on the blocking pool so request
/// dispatch keeps moving.
pub async fn hash_password(plain: String) -> Result<String, PasswordError> {
    match tokio::task::spawn_blocking(move || hash_password_sync(&plain)).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "hashing task failed");
            Err(PasswordError::Hash)
        }
    }
}

pub async fn verify_password(plain: String, hash: String) -> Result<bool, PasswordError> {
    match tokio::task::spawn_blocking(move || verify_password_sync(&plain, &hash)).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "verification task failed");
            Err(PasswordError::Hash)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_and_verify_roundtrip() {
        let password = "pw123456";
        let hash = hash_password(password.into()).await.expect("hashing should succeed");
        assert!(verify_password(password.into(), hash)
            .await
            .expect("verify should succeed"));
    }

    #[tokio::test]
    async fn verify_rejects_wrong_password() {
        let hash = hash_password("correct-horse-battery-staple".into())
            .await
            .expect("hashing should succeed");
        assert!(!verify_password("wrong-password".into(), hash)
            .await
            .expect("verify should not error"));
    }

    #[tokio::test]
    async fn same_password_hashes_differently_each_call() {
        let first = hash_password("pw123456".into()).await.expect("hash");
        let second = hash_password("pw123456".into()).await.expect("hash");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn malformed_hash_fails_closed() {
        let err = verify_password("anything".into(), "not-a-valid-hash".into())
            .await
            .unwrap_err();
        assert!(matches!(err, PasswordError::MalformedHash));
    }
}
