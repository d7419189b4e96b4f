use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{NodeError, Result};
use crate::record::ResultRecord;

/// Result of adding a record to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    Stored,
    /// A record with the same name, phone and identifier already exists.
    Duplicate,
}

/// Append-only record list, optionally persisted as a JSON array file.
///
/// The whole file is rewritten after each insert.
#[derive(Debug, Default)]
pub struct RecordStore {
    path: Option<PathBuf>,
    records: Vec<ResultRecord>,
}

impl RecordStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Start a fresh store at `path`, discarding anything already there.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: Some(path.as_ref().to_path_buf()),
            records: Vec::new(),
        };
        store.save()?;
        Ok(store)
    }

    /// Load the store at `path`. A missing or unreadable file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                debug!(path = %path.display(), error = %err, "record store not valid JSON, starting empty");
                Vec::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(NodeError::Store { path, source }),
        };
        Ok(Self {
            path: Some(path),
            records,
        })
    }

    /// Append a record unless an equivalent one is already stored.
    pub fn insert(&mut self, record: ResultRecord) -> Result<Insert> {
        if self
            .records
            .iter()
            .any(|existing| existing.same_delivery(&record))
        {
            return Ok(Insert::Duplicate);
        }
        self.records.push(record);
        self.save()?;
        Ok(Insert::Stored)
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Records whose name, phone or identifier contain `query` (case-insensitive).
    ///
    /// An empty query returns everything.
    pub fn search(&self, query: &str) -> Vec<&ResultRecord> {
        let query = query.trim();
        self.records
            .iter()
            .filter(|record| query.is_empty() || record.matches(query))
            .collect()
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(&self.records)?;
        std::fs::write(path, json).map_err(|source| NodeError::Store {
            path: path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "scanlink-store-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir.join("records.json")
    }

    fn record(name: &str, phone: &str, identifier: &str) -> ResultRecord {
        ResultRecord {
            name: name.to_string(),
            phone: phone.to_string(),
            raw_text: String::new(),
            identifier: identifier.to_string(),
        }
    }

    #[test]
    fn duplicates_are_suppressed() {
        let mut store = RecordStore::in_memory();
        let r = record("张*", "13812345678", "1234567890123");

        assert_eq!(store.insert(r.clone()).unwrap(), Insert::Stored);
        assert_eq!(store.insert(r).unwrap(), Insert::Duplicate);
        assert_eq!(
            store
                .insert(record("张*", "13812345678", "1234567890124"))
                .unwrap(),
            Insert::Stored
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn create_truncates_and_persists() {
        let path = temp_path("create");
        std::fs::write(&path, r#"[{"name":"old","phone":"x","identifier":"y"}]"#).unwrap();

        let mut store = RecordStore::create(&path).unwrap();
        assert!(store.is_empty());
        store
            .insert(record("李*", "13912345678", "9787115428028"))
            .unwrap();

        let reopened = RecordStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.records()[0].identifier, "9787115428028");
        assert_eq!(reopened.path(), Some(path.as_path()));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn open_tolerates_missing_and_corrupt_files() {
        let path = temp_path("corrupt");
        assert!(RecordStore::open(&path).unwrap().is_empty());

        std::fs::write(&path, b"not json").unwrap();
        assert!(RecordStore::open(&path).unwrap().is_empty());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn search_matches_any_field() {
        let mut store = RecordStore::in_memory();
        store
            .insert(record("张*", "13812345678", "1234567890123"))
            .unwrap();
        store
            .insert(record("李*", "13912345678", "9787115428028"))
            .unwrap();

        assert_eq!(store.search("138").len(), 1);
        assert_eq!(store.search("李").len(), 1);
        assert_eq!(store.search("97871").len(), 1);
        assert_eq!(store.search("").len(), 2);
        assert!(store.search("nobody").is_empty());
    }
}
