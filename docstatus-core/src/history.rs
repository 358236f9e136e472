//! Verification history: an append-only log republished as an observable,
//! newest-first list.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::{
    error::DocStatusError,
    storage::HistoryStore,
    types::DocStatus,
};

/// One verification attempt, successful or not. Never updated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct HistoryRecord {
    /// The scanned code.
    pub code: String,
    /// The verdict.
    pub status: DocStatus,
    /// Server message or failure description.
    pub description: String,
    /// Epoch millis at which the attempt completed.
    pub timestamp_ms: u64,
}

/// Receives the refreshed history list after every append.
#[uniffi::export(with_foreign)]
pub trait HistoryObserver: Send + Sync {
    /// Called with the full list, newest first.
    fn on_history_changed(&self, records: Vec<HistoryRecord>);
}

/// Appends to the [`HistoryStore`] and republishes the list.
pub struct HistoryFeed {
    store: Arc<dyn HistoryStore>,
    sender: watch::Sender<Vec<HistoryRecord>>,
    observer: RwLock<Option<Arc<dyn HistoryObserver>>>,
}

impl HistoryFeed {
    /// Creates a feed over `store`, seeded with what the store already holds.
    /// An unreadable store starts the feed empty.
    #[must_use]
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        let initial = store.list_newest_first().unwrap_or_else(|e| {
            log::error!("failed to load verification history: {e}");
            Vec::new()
        });
        let (sender, _) = watch::channel(initial);
        Self {
            store,
            sender,
            observer: RwLock::new(None),
        }
    }

    /// Appends `record` and publishes the refreshed list.
    ///
    /// # Errors
    /// Returns an error if the store rejects the append or cannot be re-read.
    pub fn append(&self, record: HistoryRecord) -> Result<(), DocStatusError> {
        self.store.append(record)?;
        let records = self.store.list_newest_first()?;
        self.sender.send_replace(records.clone());

        let observer = self
            .observer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(observer) = observer {
            observer.on_history_changed(records);
        }
        Ok(())
    }

    /// The current list, newest first.
    #[must_use]
    pub fn records(&self) -> Vec<HistoryRecord> {
        self.sender.borrow().clone()
    }

    /// Subscribes to list changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<HistoryRecord>> {
        self.sender.subscribe()
    }

    /// Registers the observer notified after every append, replacing any
    /// previous one.
    pub fn set_observer(&self, observer: Option<Arc<dyn HistoryObserver>>) {
        *self.observer.write().unwrap_or_else(PoisonError::into_inner) = observer;
    }
}
