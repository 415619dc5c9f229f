//! Login against the progress store.
//!
//! The store only ever holds an opaque verifier string produced by a
//! `CredentialVerifier`; the raw credential is never persisted or logged.

use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use crate::domain::User;
use crate::progress::{PersistenceError, ProgressStore};

pub trait CredentialVerifier: Send + Sync {
  /// Verifier string stored at registration.
  fn enroll(&self, credential: &str) -> String;

  fn verify(&self, presented: &str, stored: &str) -> bool;
}

/// Hex SHA-256 of the credential, the format existing user records carry.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Verifier;

impl CredentialVerifier for Sha256Verifier {
  fn enroll(&self, credential: &str) -> String {
    format!("{:x}", Sha256::digest(credential.as_bytes()))
  }

  fn verify(&self, presented: &str, stored: &str) -> bool {
    let candidate = self.enroll(presented);
    // same length always (64 hex chars); compare without early exit
    candidate.len() == stored.len()
      && candidate.bytes().zip(stored.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
  }
}

/// Create a user whose stored credential is the verifier's enrollment string.
#[instrument(level = "info", skip(store, verifier, credential), fields(%username))]
pub async fn register(
  store: &dyn ProgressStore,
  verifier: &dyn CredentialVerifier,
  username: &str,
  credential: &str,
) -> Result<User, PersistenceError> {
  let user = store.register(username.trim(), &verifier.enroll(credential)).await?;
  info!(target: "progress", username = %user.username, "User registered");
  Ok(user)
}

/// `Ok(true)` and a fresh `last_access` when the credential matches.
/// Blank input, unknown users and wrong credentials are all `Ok(false)`;
/// only store failures are errors.
#[instrument(level = "info", skip(store, verifier, credential), fields(%username))]
pub async fn validate_login(
  store: &dyn ProgressStore,
  verifier: &dyn CredentialVerifier,
  username: &str,
  credential: &str,
) -> Result<bool, PersistenceError> {
  let username = username.trim();
  if username.is_empty() || credential.is_empty() {
    return Ok(false);
  }
  let Some(user) = store.user(username).await? else {
    warn!(target: "progress", %username, "Login for unknown user");
    return Ok(false);
  };
  if !verifier.verify(credential, &user.credential) {
    warn!(target: "progress", %username, "Login rejected");
    return Ok(false);
  }
  store.touch_access(username).await?;
  info!(target: "progress", %username, "Login accepted");
  Ok(true)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::progress::{MemoryProgressStore, NullProgressStore};
  use crate::sqlite::SqliteProgressStore;

  async fn login_paths(store: &dyn ProgressStore) {
    let v = Sha256Verifier;
    let user = register(store, &v, "ana", "s3cret").await.unwrap();
    assert_ne!(user.credential, "s3cret");

    let before = store.user("ana").await.unwrap().unwrap().last_access;
    assert!(validate_login(store, &v, "ana", "s3cret").await.unwrap());
    assert!(store.user("ana").await.unwrap().unwrap().last_access >= before);

    assert!(!validate_login(store, &v, "ana", "wrong").await.unwrap());
    assert!(!validate_login(store, &v, "ghost", "s3cret").await.unwrap());
    assert!(!validate_login(store, &v, "ana", "").await.unwrap());
    assert!(!validate_login(store, &v, "  ", "s3cret").await.unwrap());
  }

  #[tokio::test]
  async fn memory_store_accepts_and_rejects() {
    login_paths(&MemoryProgressStore::new()).await;
  }

  #[tokio::test]
  async fn sqlite_store_accepts_and_rejects() {
    login_paths(&SqliteProgressStore::open_in_memory().unwrap()).await;
  }

  #[tokio::test]
  async fn store_outage_is_an_error_not_a_rejection() {
    let err = validate_login(&NullProgressStore, &Sha256Verifier, "ana", "x").await.unwrap_err();
    assert!(matches!(err, PersistenceError::Unavailable(_)));
  }

  #[test]
  fn enrollment_is_hex_sha256() {
    let v = Sha256Verifier;
    assert_eq!(v.enroll("abc"), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    assert!(v.verify("abc", &v.enroll("abc")));
    assert!(!v.verify("abd", &v.enroll("abc")));
  }
}
