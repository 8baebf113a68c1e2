//! Argon2id password hashing.
//!
//! Digests are PHC strings (`$argon2id$v=19$...`) carrying their own salt and cost
//! parameters, so a verifier never needs anything besides the stored string.

use argon2::{
    password_hash::{self, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use rand::rngs::OsRng;
use std::sync::OnceLock;
use tokio::task;
use tracing::{error, warn};

use super::AuthError;

const DUMMY_CREDENTIAL: &str = "worldpass-dummy-credential";

static DUMMY_DIGEST: OnceLock<String> = OnceLock::new();

/// Hash a plaintext password with a fresh random salt.
///
/// # Errors
/// Returns `HashingFailure` for an empty plaintext or when Argon2 fails.
pub fn hash(plaintext: &str) -> Result<String, AuthError> {
    if plaintext.is_empty() {
        return Err(AuthError::HashingFailure);
    }

    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {e}");
            AuthError::HashingFailure
        })
}

/// Check a plaintext against a stored digest.
///
/// A mismatch is `Ok(false)`; only a digest that cannot be parsed is an error.
///
/// # Errors
/// Returns `HashingFailure` when `digest` is not a valid PHC string.
pub fn verify(plaintext: &str, digest: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(digest).map_err(|e| {
        error!("Stored password digest is malformed: {e}");
        AuthError::HashingFailure
    })?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!("Failed to verify password: {e}");
            Err(AuthError::HashingFailure)
        }
    }
}

/// Run a verification against a throwaway digest so that an unknown account
/// costs the same as a wrong password.
pub fn verify_dummy(plaintext: &str) {
    if let Some(digest) = cached_digest(&DUMMY_DIGEST, || hash(DUMMY_CREDENTIAL)) {
        let _ = verify(plaintext, digest);
    }
}

/// Fill `cell` on first success. A failed attempt leaves it empty so the next
/// call tries again.
fn cached_digest(
    cell: &OnceLock<String>,
    make: impl FnOnce() -> Result<String, AuthError>,
) -> Option<&str> {
    if let Some(digest) = cell.get() {
        return Some(digest);
    }

    match make() {
        Ok(digest) => Some(cell.get_or_init(|| digest)),
        Err(e) => {
            warn!("Dummy digest unavailable, will retry: {e}");
            None
        }
    }
}

/// [`hash`] on the blocking pool.
///
/// # Errors
/// Same as [`hash`]; a panicked worker is reported as `HashingFailure`.
pub async fn hash_blocking(plaintext: String) -> Result<String, AuthError> {
    task::spawn_blocking(move || hash(&plaintext))
        .await
        .map_err(|e| {
            error!("Password hashing task failed: {e}");
            AuthError::HashingFailure
        })?
}

/// [`verify`] on the blocking pool.
///
/// # Errors
/// Same as [`verify`]; a panicked worker is reported as `HashingFailure`.
pub async fn verify_blocking(plaintext: String, digest: String) -> Result<bool, AuthError> {
    task::spawn_blocking(move || verify(&plaintext, &digest))
        .await
        .map_err(|e| {
            error!("Password verification task failed: {e}");
            AuthError::HashingFailure
        })?
}

/// [`verify_dummy`] on the blocking pool.
pub async fn verify_dummy_blocking(plaintext: String) {
    if let Err(e) = task::spawn_blocking(move || verify_dummy(&plaintext)).await {
        error!("Dummy verification task failed: {e}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let digest = hash("longenough1").unwrap();
        assert!(digest.starts_with("$argon2id$"));
        assert!(verify("longenough1", &digest).unwrap());
        assert!(!verify("longenough2", &digest).unwrap());
    }

    #[test]
    fn same_plaintext_gets_distinct_salts() {
        let first = hash("longenough1").unwrap();
        let second = hash("longenough1").unwrap();
        assert_ne!(first, second);
        assert!(verify("longenough1", &second).unwrap());
    }

    #[test]
    fn empty_plaintext_is_rejected() {
        assert_eq!(hash(""), Err(AuthError::HashingFailure));
    }

    #[test]
    fn malformed_digest_is_an_error() {
        assert_eq!(
            verify("longenough1", "not-a-phc-string"),
            Err(AuthError::HashingFailure)
        );
    }

    #[test]
    fn digest_never_contains_plaintext() {
        let digest = hash("correct horse battery").unwrap();
        assert!(!digest.contains("correct horse battery"));
    }

    #[tokio::test]
    async fn blocking_wrappers_match_sync_results() {
        let digest = hash_blocking("longenough1".to_string()).await.unwrap();
        assert!(verify_blocking("longenough1".to_string(), digest.clone())
            .await
            .unwrap());
        assert!(!verify_blocking("nope-nope".to_string(), digest)
            .await
            .unwrap());
        verify_dummy_blocking("whatever".to_string()).await;
    }

    #[test]
    fn failed_dummy_digest_is_retried() {
        let cell = OnceLock::new();

        assert_eq!(cached_digest(&cell, || Err(AuthError::HashingFailure)), None);
        assert!(cell.get().is_none());

        let digest = cached_digest(&cell, || hash(DUMMY_CREDENTIAL)).unwrap();
        assert!(verify(DUMMY_CREDENTIAL, digest).unwrap());

        // Once filled, the maker is not consulted again.
        assert_eq!(
            cached_digest(&cell, || Err(AuthError::HashingFailure)),
            Some(digest)
        );
    }
}
