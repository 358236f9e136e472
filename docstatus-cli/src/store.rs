//! File-backed storage for the CLI.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tempfile::NamedTempFile;

use docstatus_core::{
    storage::{AtomicBlobStore, HistoryStore, StorageError, StorageResult},
    HistoryRecord,
};

fn blob_error(path: &Path, e: &io::Error) -> StorageError {
    StorageError::BlobStore(format!("{}: {e}", path.display()))
}

/// Blobs as files under a root directory.
///
/// Writes go to a temp file in the target's directory that is then renamed
/// over the target.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Creates a store rooted at `root`. The directory is created on first
    /// write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir));
        if escapes {
            return Err(StorageError::BlobStore(format!(
                "blob path escapes the store: {path}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl AtomicBlobStore for FsBlobStore {
    fn read(&self, path: String) -> StorageResult<Option<Vec<u8>>> {
        let path = self.resolve(&path)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(blob_error(&path, &e)),
        }
    }

    fn write_atomic(&self, path: String, bytes: Vec<u8>) -> StorageResult<()> {
        let path = self.resolve(&path)?;
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent).map_err(|e| blob_error(parent, &e))?;

        // the temp file is removed on drop, so no error path leaves it behind
        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| blob_error(parent, &e))?;
        tmp.write_all(&bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| blob_error(tmp.path(), &e))?;
        tmp.persist(&path)
            .map(drop)
            .map_err(|e| blob_error(&path, &e.error))
    }

    fn delete(&self, path: String) -> StorageResult<()> {
        let path = self.resolve(&path)?;
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(blob_error(&path, &e)),
            _ => Ok(()),
        }
    }
}

/// History as a JSON Lines file, one record per line.
pub struct JsonlHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlHistoryStore {
    /// Creates a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn history_error(&self, e: &io::Error) -> StorageError {
        StorageError::History(format!("{}: {e}", self.path.display()))
    }
}

impl HistoryStore for JsonlHistoryStore {
    fn append(&self, record: HistoryRecord) -> StorageResult<()> {
        let mut line = serde_json::to_string(&record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.history_error(&e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
            .map_err(|e| self.history_error(&e))
    }

    fn list_newest_first(&self) -> StorageResult<Vec<HistoryRecord>> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.history_error(&e)),
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| self.history_error(&e))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: HistoryRecord = serde_json::from_str(&line)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            records.push(record);
        }

        records.reverse();
        records.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstatus_core::{session::TokenStore, DocStatus};

    fn record(code: &str, timestamp_ms: u64) -> HistoryRecord {
        HistoryRecord {
            code: code.to_string(),
            status: DocStatus::Valid,
            description: "ok".to_string(),
            timestamp_ms,
        }
    }

    #[test]
    fn test_blob_roundtrip_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().join("data"));

        assert_eq!(store.read("session.json".to_string()).unwrap(), None);
        store
            .write_atomic("session.json".to_string(), b"one".to_vec())
            .unwrap();
        store
            .write_atomic("session.json".to_string(), b"two".to_vec())
            .unwrap();
        assert_eq!(
            store.read("session.json".to_string()).unwrap().as_deref(),
            Some(&b"two"[..])
        );
        assert_eq!(fs::read_dir(dir.path().join("data")).unwrap().count(), 1);

        store.delete("session.json".to_string()).unwrap();
        store.delete("session.json".to_string()).unwrap();
        assert_eq!(store.read("session.json".to_string()).unwrap(), None);
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // a directory in the way makes the final rename fail
        fs::create_dir(dir.path().join("session.json")).unwrap();
        let store = FsBlobStore::new(dir.path());

        assert!(matches!(
            store.write_atomic("session.json".to_string(), b"T1".to_vec()),
            Err(StorageError::BlobStore(_))
        ));
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("session.json")]);
    }

    #[test]
    fn test_blob_path_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        assert!(store.read("../outside".to_string()).is_err());
        assert!(store
            .write_atomic("/etc/passwd".to_string(), Vec::new())
            .is_err());
    }

    #[test]
    fn test_token_survives_a_new_store() {
        let dir = tempfile::tempdir().unwrap();
        TokenStore::new(std::sync::Arc::new(FsBlobStore::new(dir.path())))
            .save("T1")
            .unwrap();

        let reopened = TokenStore::new(std::sync::Arc::new(FsBlobStore::new(dir.path())));
        assert!(reopened.is_valid());
        assert_eq!(reopened.load().unwrap().as_deref(), Some("T1"));
    }

    #[test]
    fn test_history_is_listed_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlHistoryStore::new(dir.path().join("history.jsonl"));
        assert!(store.list_newest_first().unwrap().is_empty());

        store.append(record("A", 10)).unwrap();
        store.append(record("B", 30)).unwrap();
        store.append(record("C", 20)).unwrap();
        store.append(record("D", 30)).unwrap();

        let codes: Vec<String> = store
            .list_newest_first()
            .unwrap()
            .into_iter()
            .map(|r| r.code)
            .collect();
        assert_eq!(codes, vec!["D", "B", "C", "A"]);
    }

    #[test]
    fn test_corrupted_history_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        fs::write(&path, "{not json}\n").unwrap();

        let store = JsonlHistoryStore::new(path);
        assert!(matches!(
            store.list_newest_first(),
            Err(StorageError::Serialization(_))
        ));
    }
}
