//! Durable token storage with a time-to-live.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    config::DEFAULT_TOKEN_TTL,
    error::DocStatusError,
    storage::{AtomicBlobStore, StorageError},
    utils::now_millis,
};

/// Blob path under which the session is persisted.
pub const SESSION_BLOB_PATH: &str = "session.json";

/// Persisted form of the session. Token and issue time are written together
/// in a single blob so neither can be updated without the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    /// The opaque bearer token.
    pub token: String,
    /// Epoch millis at which the token was saved. `0` means unset.
    #[serde(default)]
    pub issued_at_ms: u64,
}

/// Persists the bearer token and answers whether it is still usable.
pub struct TokenStore {
    blobs: Arc<dyn AtomicBlobStore>,
    ttl: Duration,
}

impl TokenStore {
    /// Creates a store with the default 30 minute TTL.
    #[must_use]
    pub fn new(blobs: Arc<dyn AtomicBlobStore>) -> Self {
        Self::with_ttl(blobs, DEFAULT_TOKEN_TTL)
    }

    /// Creates a store with a custom TTL.
    #[must_use]
    pub fn with_ttl(blobs: Arc<dyn AtomicBlobStore>, ttl: Duration) -> Self {
        Self { blobs, ttl }
    }

    /// Saves `token` stamped with the current time, replacing any previous one.
    ///
    /// # Errors
    /// Returns an error if the blob store write fails.
    pub fn save(&self, token: &str) -> Result<(), DocStatusError> {
        self.save_at(token, now_millis())
    }

    pub(crate) fn save_at(&self, token: &str, issued_at_ms: u64) -> Result<(), DocStatusError> {
        let stored = StoredToken {
            token: token.to_string(),
            issued_at_ms,
        };
        let bytes = serde_json::to_vec(&stored)?;
        self.blobs
            .write_atomic(SESSION_BLOB_PATH.to_string(), bytes)?;
        Ok(())
    }

    /// Returns the stored token, if any.
    ///
    /// # Errors
    /// Returns an error if the blob cannot be read or parsed.
    pub fn load(&self) -> Result<Option<String>, DocStatusError> {
        Ok(self.load_stored()?.map(|stored| stored.token))
    }

    /// Returns the full stored record, if any.
    ///
    /// # Errors
    /// Returns an error if the blob cannot be read or parsed.
    pub fn load_stored(&self) -> Result<Option<StoredToken>, DocStatusError> {
        let Some(bytes) = self.blobs.read(SESSION_BLOB_PATH.to_string())? else {
            return Ok(None);
        };
        let stored = serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::Serialization(format!("corrupted session blob: {e}"))
        })?;
        Ok(Some(stored))
    }

    /// Whether a token is stored and younger than the TTL.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_millis())
    }

    /// Same as [`Self::is_valid`], evaluated at `now_ms`.
    #[must_use]
    pub fn is_valid_at(&self, now_ms: u64) -> bool {
        self.expires_in_at(now_ms).is_some()
    }

    /// Time left before the stored token expires, or `None` if there is no
    /// usable token.
    #[must_use]
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in_at(now_millis())
    }

    /// Same as [`Self::expires_in`], evaluated at `now_ms`.
    #[must_use]
    pub fn expires_in_at(&self, now_ms: u64) -> Option<Duration> {
        let stored = match self.load_stored() {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("treating unreadable session as absent: {e}");
                return None;
            }
        };

        if stored.issued_at_ms == 0 {
            return None;
        }

        let age = Duration::from_millis(now_ms.saturating_sub(stored.issued_at_ms));
        Some(self.ttl.saturating_sub(age)).filter(|left| !left.is_zero())
    }

    /// Removes the token and its issue time.
    ///
    /// # Errors
    /// Returns an error if the blob store delete fails.
    pub fn clear(&self) -> Result<(), DocStatusError> {
        self.blobs.delete(SESSION_BLOB_PATH.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryBlobStore;
    use test_case::test_case;

    const ISSUED: u64 = 1_700_000_000_000;

    fn store() -> (Arc<InMemoryBlobStore>, TokenStore) {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let store = TokenStore::new(blobs.clone());
        (blobs, store)
    }

    #[test]
    fn test_absent_token_is_invalid() {
        let (_, store) = store();
        assert!(store.load().unwrap().is_none());
        assert!(!store.is_valid_at(ISSUED));
    }

    #[test_case(0, true ; "just issued")]
    #[test_case(1_799_999, true ; "one milli before expiry")]
    #[test_case(1_800_000, false ; "exactly at ttl")]
    #[test_case(5_000_000, false ; "long expired")]
    fn test_validity_window(elapsed_ms: u64, expected: bool) {
        let (_, store) = store();
        store.save_at("T1", ISSUED).unwrap();
        assert_eq!(store.is_valid_at(ISSUED + elapsed_ms), expected);
    }

    #[test_case(0, Some(1_800) ; "full ttl left")]
    #[test_case(1_200_000, Some(600) ; "ten minutes left")]
    #[test_case(1_800_000, None ; "expired")]
    fn test_expires_in(elapsed_ms: u64, expected_secs: Option<u64>) {
        let (_, store) = store();
        store.save_at("T1", ISSUED).unwrap();
        assert_eq!(
            store.expires_in_at(ISSUED + elapsed_ms),
            expected_secs.map(Duration::from_secs)
        );
    }

    #[test]
    fn test_no_expiry_without_a_token() {
        let (_, store) = store();
        assert_eq!(store.expires_in(), None);
        store.save_at("T1", 0).unwrap();
        assert_eq!(store.expires_in_at(ISSUED), None);
    }

    #[test]
    fn test_zero_issue_time_is_invalid() {
        let (_, store) = store();
        store.save_at("T1", 0).unwrap();
        assert!(!store.is_valid_at(1_000));
    }

    #[test]
    fn test_missing_issue_time_reads_as_zero() {
        let (blobs, store) = store();
        blobs
            .write_atomic(SESSION_BLOB_PATH.to_string(), br#"{"token":"T1"}"#.to_vec())
            .unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("T1"));
        assert!(!store.is_valid_at(ISSUED));
    }

    #[test]
    fn test_corrupted_blob_is_invalid() {
        let (blobs, store) = store();
        blobs
            .write_atomic(SESSION_BLOB_PATH.to_string(), b"not json".to_vec())
            .unwrap();
        assert!(store.load().is_err());
        assert!(!store.is_valid_at(ISSUED));
    }

    #[test]
    fn test_save_overwrites_and_clear_removes() {
        let (_, store) = store();
        store.save_at("T1", ISSUED).unwrap();
        store.save_at("T2", ISSUED + 10).unwrap();
        assert_eq!(
            store.load_stored().unwrap(),
            Some(StoredToken {
                token: "T2".to_string(),
                issued_at_ms: ISSUED + 10,
            })
        );

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(!store.is_valid_at(ISSUED + 10));
    }

    #[test]
    fn test_save_uses_current_time() {
        let (_, store) = store();
        store.save("T1").unwrap();
        assert!(store.is_valid());
    }
}
