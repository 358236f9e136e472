//! Runs verifications and writes every attempt to history.

use std::sync::Arc;

use crate::{
    client::VerificationClient,
    history::{HistoryFeed, HistoryRecord},
    types::{DocStatus, VerificationOutcome},
    utils::now_millis,
};

/// Couples the [`VerificationClient`] with the [`HistoryFeed`].
pub struct VerificationRepository {
    client: Arc<VerificationClient>,
    history: Arc<HistoryFeed>,
}

impl VerificationRepository {
    /// Creates a repository.
    #[must_use]
    pub const fn new(client: Arc<VerificationClient>, history: Arc<HistoryFeed>) -> Self {
        Self { client, history }
    }

    /// Verifies `code` and records the attempt. `device_info` overrides the
    /// configured device description for this request.
    ///
    /// This never fails: a transport error, a rejection or an unreadable
    /// response all become [`DocStatus::Invalid`] with a description of the
    /// error, and are recorded like any other verdict.
    pub async fn check_and_save(
        &self,
        code: &str,
        device_info: Option<String>,
    ) -> VerificationOutcome {
        let outcome = match self.client.verify(code.to_string(), device_info).await {
            Ok(response) => VerificationOutcome {
                status: response.doc_status(),
                description: response.message,
            },
            Err(e) => {
                log::warn!("verification of scanned code failed: {e}");
                VerificationOutcome {
                    status: DocStatus::Invalid,
                    description: format!("Network error: {e}"),
                }
            }
        };

        let record = HistoryRecord {
            code: code.to_string(),
            status: outcome.status,
            description: outcome.description.clone(),
            timestamp_ms: now_millis(),
        };
        if let Err(e) = self.history.append(record) {
            log::error!("failed to record verification in history: {e}");
        }

        outcome
    }
}
