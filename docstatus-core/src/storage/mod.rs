//! Platform storage interfaces.
//!
//! The SDK never owns a database. The host app provides a blob store for the
//! session and an append-only log for verification history; both are
//! exported through `UniFFI` so Kotlin and Swift can implement them.

mod error;
mod memory;

pub use error::{StorageError, StorageResult};
pub use memory::{InMemoryBlobStore, InMemoryHistoryStore};

use crate::history::HistoryRecord;

/// Atomic blob store for small files (e.g. `session.json`).
#[uniffi::export(with_foreign)]
pub trait AtomicBlobStore: Send + Sync {
    /// Reads the blob at `path`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn read(&self, path: String) -> StorageResult<Option<Vec<u8>>>;

    /// Writes bytes atomically to `path`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn write_atomic(&self, path: String, bytes: Vec<u8>) -> StorageResult<()>;

    /// Deletes the blob at `path`. Deleting a missing blob is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete(&self, path: String) -> StorageResult<()>;
}

/// Append-only log of verification attempts.
///
/// Records are never updated or deleted once appended.
#[uniffi::export(with_foreign)]
pub trait HistoryStore: Send + Sync {
    /// Appends a record to the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn append(&self, record: HistoryRecord) -> StorageResult<()>;

    /// Returns every record ordered by timestamp, newest first. Records with
    /// the same timestamp are returned latest-appended first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn list_newest_first(&self) -> StorageResult<Vec<HistoryRecord>>;
}
