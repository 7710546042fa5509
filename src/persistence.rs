use crate::calculation::Calculation;
use crate::error::PersistError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Format version written into every history file
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    #[serde(default)]
    records: Vec<Calculation>,
}

/// Reads and writes the calculation history as a JSON document
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Overwrite the store with `records`.
    ///
    /// The document is written to a temporary file next to the target and
    /// renamed over it, so a crash mid-write leaves the previous file intact.
    pub fn save(&self, records: &[Calculation]) -> Result<(), PersistError> {
        let display = self.path.display().to_string();
        let write_failure = |e: &dyn std::fmt::Display| PersistError::write_failure(&display, e.to_string());

        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| write_failure(&e))?;

        let snapshot = Snapshot {
            version: FORMAT_VERSION,
            records: records.to_vec(),
        };
        let content = serde_json::to_string_pretty(&snapshot).map_err(|e| write_failure(&e))?;

        let mut temp_file = NamedTempFile::new_in(&parent).map_err(|e| write_failure(&e))?;
        temp_file
            .write_all(content.as_bytes())
            .and_then(|_| temp_file.flush())
            .map_err(|e| write_failure(&e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| write_failure(&e.error))?;

        info!("Saved {} calculations to {}", records.len(), display);
        Ok(())
    }

    /// Read every record from the store
    pub fn load(&self) -> Result<Vec<Calculation>, PersistError> {
        let display = self.path.display().to_string();
        let content = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PersistError::file_not_found(&display),
            _ => PersistError::read_failure(&display, &e),
        })?;

        if content.trim().is_empty() {
            debug!("History file {} is empty", display);
            return Ok(Vec::new());
        }

        let snapshot: Snapshot = serde_json::from_str(&content)
            .map_err(|e| PersistError::parse(&display, e.to_string()))?;

        if snapshot.version != FORMAT_VERSION {
            return Err(PersistError::parse(
                &display,
                format!("unsupported format version {}", snapshot.version),
            ));
        }

        info!("Loaded {} calculations from {}", snapshot.records.len(), display);
        Ok(snapshot.records)
    }

    /// Delete the store file if present
    pub fn remove(&self) -> Result<(), PersistError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistError::write_failure(
                self.path.display().to_string(),
                e.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::Operation;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::tempdir;

    fn record(op: Operation, a: &str, b: &str) -> Calculation {
        Calculation::compute(
            op,
            Decimal::from_str(a).unwrap(),
            Decimal::from_str(b).unwrap(),
            10,
        )
        .unwrap()
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp_dir = tempdir().unwrap();
        let store = HistoryStore::new(temp_dir.path().join("nested").join("history.json"));

        let records = vec![
            record(Operation::Add, "2.50", "3"),
            record(Operation::Divide, "1", "3"),
            record(Operation::Power, "2", "10"),
        ];
        store.save(&records).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, records);
        assert_eq!(loaded[0].operand_a().to_string(), "2.50");
    }

    #[test]
    fn test_save_overwrites() {
        let temp_dir = tempdir().unwrap();
        let store = HistoryStore::new(temp_dir.path().join("history.json"));

        store.save(&[record(Operation::Add, "1", "1"), record(Operation::Add, "2", "2")]).unwrap();
        store.save(&[record(Operation::Subtract, "5", "1")]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].operation(), Operation::Subtract);
    }

    #[test]
    fn test_file_layout() {
        let temp_dir = tempdir().unwrap();
        let store = HistoryStore::new(temp_dir.path().join("history.json"));
        store.save(&[record(Operation::Add, "2", "3")]).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        let entry = &raw["records"][0];
        assert_eq!(raw["version"], 1);
        assert_eq!(entry["operation"], "add");
        assert_eq!(entry["operand_a"], "2");
        assert_eq!(entry["operand_b"], "3");
        assert_eq!(entry["result"], "5");
        assert!(entry["timestamp"].is_string());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempdir().unwrap();
        let store = HistoryStore::new(temp_dir.path().join("missing.json"));
        assert!(matches!(store.load(), Err(PersistError::FileNotFound { .. })));
    }

    #[test]
    fn test_load_empty_and_malformed() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("history.json");
        let store = HistoryStore::new(&path);

        std::fs::write(&path, "  \n").unwrap();
        assert!(store.load().unwrap().is_empty());

        std::fs::write(&path, r#"{"version": 1}"#).unwrap();
        assert!(store.load().unwrap().is_empty());

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(store.load(), Err(PersistError::ParseError { .. })));

        std::fs::write(&path, r#"{"version": 7, "records": []}"#).unwrap();
        assert!(matches!(store.load(), Err(PersistError::ParseError { .. })));
    }

    #[test]
    fn test_load_unreadable_path_is_not_a_parse_error() {
        let temp_dir = tempdir().unwrap();
        let store = HistoryStore::new(temp_dir.path());

        let err = store.load().unwrap_err();
        assert!(matches!(err, PersistError::ReadFailure { .. }));
        assert!(!err.to_string().contains("parse"));
    }

    #[test]
    fn test_remove() {
        let temp_dir = tempdir().unwrap();
        let store = HistoryStore::new(temp_dir.path().join("history.json"));
        store.save(&[]).unwrap();
        assert!(store.exists());
        store.remove().unwrap();
        assert!(!store.exists());
        store.remove().unwrap();
    }
}
