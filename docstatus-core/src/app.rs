//! The application object: owns the session lifecycle and wires the
//! client, history and scanner together.

use std::sync::Arc;

use crate::{
    biometric::{require_biometrics, BiometricAuthenticator, BiometricPrompt},
    client::VerificationClient,
    config::ClientConfig,
    error::DocStatusError,
    history::{HistoryFeed, HistoryObserver, HistoryRecord},
    repository::VerificationRepository,
    scan::ScanCoordinator,
    session::{Session, TokenStore},
    storage::{AtomicBlobStore, HistoryStore},
    types::{LoginResponse, VerificationOutcome},
};

/// First screen to show after start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum StartDestination {
    /// No usable token: ask for credentials.
    Login,
    /// A stored token was restored: go straight to scanning.
    Scanner,
}

/// Entry point for the host app.
///
/// This is the only place that writes the token. The durable [`TokenStore`]
/// and the in-memory [`Session`] are always set and cleared together.
#[derive(uniffi::Object)]
pub struct DocStatusApp {
    session: Arc<Session>,
    tokens: TokenStore,
    client: Arc<VerificationClient>,
    repository: Arc<VerificationRepository>,
    history: Arc<HistoryFeed>,
    scanner: Arc<ScanCoordinator>,
    biometrics: Arc<dyn BiometricAuthenticator>,
}

impl DocStatusApp {
    /// The session context shared with the request pipeline.
    #[must_use]
    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.session)
    }

    /// The observable history feed.
    #[must_use]
    pub fn history(&self) -> Arc<HistoryFeed> {
        Arc::clone(&self.history)
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl DocStatusApp {
    /// Wires up the SDK.
    ///
    /// # Errors
    /// Returns an error if `config` is invalid or the HTTP client cannot be
    /// built.
    #[uniffi::constructor]
    pub fn new(
        config: ClientConfig,
        blob_store: Arc<dyn AtomicBlobStore>,
        history_store: Arc<dyn HistoryStore>,
        biometrics: Arc<dyn BiometricAuthenticator>,
    ) -> Result<Self, DocStatusError> {
        let session = Arc::new(Session::new());
        let client = Arc::new(VerificationClient::new(&config, Arc::clone(&session))?);
        let history = Arc::new(HistoryFeed::new(history_store));
        let repository = Arc::new(VerificationRepository::new(
            Arc::clone(&client),
            Arc::clone(&history),
        ));
        let scanner = Arc::new(ScanCoordinator::new(
            Arc::clone(&repository),
            config.result_dwell,
        ));

        Ok(Self {
            session,
            tokens: TokenStore::with_ttl(blob_store, config.token_ttl),
            client,
            repository,
            history,
            scanner,
            biometrics,
        })
    }

    /// Restores a stored session if its token is still valid and says which
    /// screen to open.
    #[must_use]
    pub fn start(&self) -> StartDestination {
        if !self.tokens.is_valid() {
            log::info!("no valid stored session");
            return StartDestination::Login;
        }
        match self.tokens.load() {
            Ok(Some(token)) => {
                self.session.set(token);
                log::info!("restored stored session");
                StartDestination::Scanner
            }
            Ok(None) => StartDestination::Login,
            Err(e) => {
                log::warn!("failed to restore session: {e}");
                StartDestination::Login
            }
        }
    }

    /// Logs in and, on success, stores the token durably and in the session.
    ///
    /// # Errors
    /// Returns the client's error unchanged if the login call fails, or a
    /// storage error if the token cannot be saved. The session is untouched
    /// in both cases.
    pub async fn login(
        &self,
        username: String,
        password: String,
    ) -> Result<LoginResponse, DocStatusError> {
        let response = self.client.login(username, password).await?;
        self.tokens.save(&response.access_token)?;
        self.session.set(response.access_token.clone());
        log::info!("logged in");
        Ok(response)
    }

    /// Clears the token everywhere and returns the scanner to idle.
    ///
    /// # Errors
    /// Returns an error if the stored token cannot be removed. The in-memory
    /// session is cleared regardless.
    pub fn logout(&self) -> Result<(), DocStatusError> {
        let cleared = self.tokens.clear();
        self.session.clear();
        self.scanner.reset();
        log::info!("logged out");
        cleared
    }

    /// Whether a token is held and still within its TTL.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.session.is_active() && self.tokens.is_valid()
    }

    /// The scan coordinator.
    #[must_use]
    pub fn scanner(&self) -> Arc<ScanCoordinator> {
        Arc::clone(&self.scanner)
    }

    /// The verification client, for direct calls.
    #[must_use]
    pub fn client(&self) -> Arc<VerificationClient> {
        Arc::clone(&self.client)
    }

    /// Verifies `code` outside the scanner and records it in history.
    ///
    /// Failures come back as a [`crate::DocStatus::Invalid`] outcome, as they do
    /// for scans.
    pub async fn verify(&self, code: String, device_info: Option<String>) -> VerificationOutcome {
        self.repository.check_and_save(&code, device_info).await
    }

    /// Asks for biometrics, then returns the history, newest first.
    ///
    /// # Errors
    /// [`DocStatusError::BiometricUnavailable`] or
    /// [`DocStatusError::BiometricFailed`] when the user is not let through.
    pub fn open_history(&self) -> Result<Vec<HistoryRecord>, DocStatusError> {
        require_biometrics(self.biometrics.as_ref(), BiometricPrompt::history())?;
        Ok(self.history.records())
    }

    /// Registers the observer notified whenever a record is appended.
    pub fn set_history_observer(&self, observer: Arc<dyn HistoryObserver>) {
        self.history.set_observer(Some(observer));
    }

    /// Removes the history observer.
    pub fn clear_history_observer(&self) {
        self.history.set_observer(None);
    }
}
