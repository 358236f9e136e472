//! Session state: the durable token store and the in-memory session context
//! the request pipeline reads from.

mod store;

pub use store::{StoredToken, TokenStore, SESSION_BLOB_PATH};

use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};

/// The active bearer token, if any.
///
/// One instance is created by [`crate::DocStatusApp`] and shared with the
/// request pipeline it builds. It is set on login or on start-up with a valid
/// stored token and cleared on logout. Last writer wins.
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<SecretString>>,
}

impl Session {
    /// Creates a session with no active token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `token` the active credential.
    pub fn set(&self, token: String) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            Some(SecretString::from(token));
    }

    /// Drops the active credential.
    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a token is currently held.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Renders the `Authorization` header value for the active token.
    #[must_use]
    pub fn bearer_header(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_set_and_clear() {
        let session = Session::new();
        assert!(!session.is_active());
        assert!(session.bearer_header().is_none());

        session.set("T1".to_string());
        assert!(session.is_active());
        assert_eq!(session.bearer_header().as_deref(), Some("Bearer T1"));

        session.set("T2".to_string());
        assert_eq!(session.bearer_header().as_deref(), Some("Bearer T2"));

        session.clear();
        assert!(!session.is_active());
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let session = Session::new();
        session.set("super-secret".to_string());
        assert!(!format!("{session:?}").contains("super-secret"));
    }
}
