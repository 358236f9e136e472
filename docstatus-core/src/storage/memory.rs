//! In-memory implementations of the storage traits.
//!
//! Nothing here survives the process. They back unit and integration tests
//! and hosts that do not need persistence.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::history::HistoryRecord;

use super::{AtomicBlobStore, HistoryStore, StorageError, StorageResult};

/// Blob store keyed by path, held in a `HashMap`.
#[derive(Debug, Default, uniffi::Object)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

#[uniffi::export]
impl InMemoryBlobStore {
    /// Creates an empty store.
    #[uniffi::constructor]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AtomicBlobStore for InMemoryBlobStore {
    fn read(&self, path: String) -> StorageResult<Option<Vec<u8>>> {
        let guard = self
            .blobs
            .lock()
            .map_err(|_| StorageError::BlobStore("mutex poisoned".to_string()))?;
        Ok(guard.get(&path).cloned())
    }

    fn write_atomic(&self, path: String, bytes: Vec<u8>) -> StorageResult<()> {
        let mut guard = self
            .blobs
            .lock()
            .map_err(|_| StorageError::BlobStore("mutex poisoned".to_string()))?;
        guard.insert(path, bytes);
        Ok(())
    }

    fn delete(&self, path: String) -> StorageResult<()> {
        let mut guard = self
            .blobs
            .lock()
            .map_err(|_| StorageError::BlobStore("mutex poisoned".to_string()))?;
        guard.remove(&path);
        Ok(())
    }
}

/// History log kept in insertion order.
#[derive(Debug, Default, uniffi::Object)]
pub struct InMemoryHistoryStore {
    records: Mutex<Vec<HistoryRecord>>,
}

#[uniffi::export]
impl InMemoryHistoryStore {
    /// Creates an empty log.
    #[uniffi::constructor]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn append(&self, record: HistoryRecord) -> StorageResult<()> {
        self.records
            .lock()
            .map_err(|_| StorageError::History("mutex poisoned".to_string()))?
            .push(record);
        Ok(())
    }

    fn list_newest_first(&self) -> StorageResult<Vec<HistoryRecord>> {
        let guard = self
            .records
            .lock()
            .map_err(|_| StorageError::History("mutex poisoned".to_string()))?;
        let mut records: Vec<HistoryRecord> = guard.iter().rev().cloned().collect();
        // stable: equal timestamps stay latest-appended first
        records.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        Ok(records)
    }
}
