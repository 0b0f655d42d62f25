// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-only proof store.
//!
//! One JSON file per batch, `proof-batch-NNNNNN.json`. The zero padding makes
//! lexicographic file order equal batch order, but listing never relies on
//! it: batch numbers are parsed from the names and sorted numerically.
//!
//! # Guarantees
//! - A record is written to a temp file, fsync'd, then renamed into place
//! - An existing record is never overwritten
//! - Listing fails on duplicates or gaps instead of silently skipping

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::record::ProofRecord;

pub const FILE_PREFIX: &str = "proof-batch-";
pub const FILE_SUFFIX: &str = ".json";
pub const NUMBER_WIDTH: usize = 6;

/// Handle to one stored record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId {
    pub batch_number: u64,
    pub path: PathBuf,
}

impl RecordId {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub fn record_file_name(batch_number: u64) -> String {
    format!("{}{:0width$}{}", FILE_PREFIX, batch_number, FILE_SUFFIX, width = NUMBER_WIDTH)
}

/// Batch number encoded in a record file name, if the name is one.
pub fn parse_record_file_name(name: &str) -> Option<u64> {
    let digits = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[derive(Debug, Clone)]
pub struct ProofStore {
    dir: PathBuf,
}

impl ProofStore {
    /// Opens an existing store directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(StoreError::NotFound(dir));
        }
        Ok(Self { dir })
    }

    /// Opens the store, creating the directory if absent.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            tracing::debug!("Creating proof directory {:?}", dir);
            fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn id_for(&self, batch_number: u64) -> RecordId {
        RecordId {
            batch_number,
            path: self.dir.join(record_file_name(batch_number)),
        }
    }

    /// Durably writes a new record. Fails if one already exists for the batch.
    pub fn write(&self, record: &ProofRecord) -> Result<RecordId> {
        record.validate().map_err(|reason| StoreError::InvalidRecord {
            batch: record.batch_number,
            reason,
        })?;

        let id = self.id_for(record.batch_number);
        if id.path.exists() {
            return Err(StoreError::RecordExists {
                batch: record.batch_number,
                path: id.path,
            });
        }

        let bytes = serde_json::to_vec_pretty(record)?;
        let tmp_path = id.path.with_extension("json.tmp");
        if let Err(e) = Self::write_durable(&tmp_path, &id.path, &bytes) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        self.sync_dir();

        tracing::debug!(batch = record.batch_number, path = ?id.path, "Record written");
        Ok(id)
    }

    fn write_durable(tmp_path: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut file = File::create(tmp_path).map_err(|e| StoreError::io(tmp_path, e))?;
        file.write_all(bytes).map_err(|e| StoreError::io(tmp_path, e))?;
        file.sync_all().map_err(|e| StoreError::io(tmp_path, e))?;
        fs::rename(tmp_path, path).map_err(|e| StoreError::io(path, e))
    }

    /// Persists the rename. Not every platform can fsync a directory.
    fn sync_dir(&self) {
        if let Err(e) = File::open(&self.dir).and_then(|dir| dir.sync_all()) {
            tracing::debug!(dir = ?self.dir, "Directory sync skipped: {}", e);
        }
    }

    /// Every record, ascending by batch number. The sequence must be exactly
    /// `1..=n`.
    pub fn list_ordered(&self) -> Result<Vec<RecordId>> {
        let read_dir = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;

        let mut ids = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let name = entry.file_name();
            if let Some(batch_number) = name.to_str().and_then(parse_record_file_name) {
                ids.push(RecordId {
                    batch_number,
                    path: entry.path(),
                });
            }
        }
        ids.sort();

        for (i, pair) in ids.windows(2).enumerate() {
            if pair[0].batch_number == pair[1].batch_number {
                return Err(StoreError::DuplicateBatch {
                    batch: pair[0].batch_number,
                    first: ids[i].path.clone(),
                    second: ids[i + 1].path.clone(),
                });
            }
        }
        for (expected, id) in (1u64..).zip(&ids) {
            if id.batch_number != expected {
                return Err(StoreError::MissingBatch {
                    expected,
                    found: id.batch_number,
                });
            }
        }
        Ok(ids)
    }

    pub fn read(&self, id: &RecordId) -> Result<ProofRecord> {
        let bytes = match fs::read(&id.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.path.clone()))
            }
            Err(e) => return Err(StoreError::io(&id.path, e)),
        };

        let corrupt = |reason: String| StoreError::CorruptRecord {
            path: id.path.clone(),
            reason,
        };

        let record: ProofRecord = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        record.validate().map_err(corrupt)?;
        if record.batch_number != id.batch_number {
            return Err(corrupt(format!(
                "holds batch {} but is named for batch {}",
                record.batch_number, id.batch_number
            )));
        }
        Ok(record)
    }

    pub fn read_batch(&self, batch_number: u64) -> Result<ProofRecord> {
        self.read(&self.id_for(batch_number))
    }

    /// BLAKE3 digest of the stored bytes.
    pub fn digest(&self, id: &RecordId) -> Result<[u8; 32]> {
        let bytes = fs::read(&id.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound(id.path.clone()),
            _ => StoreError::io(&id.path, e),
        })?;
        Ok(*blake3::hash(&bytes).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use tempfile::tempdir;

    #[test]
    fn test_file_names_sort_in_batch_order() {
        assert_eq!(record_file_name(7), "proof-batch-000007.json");
        let mut names: Vec<String> = [10u64, 2, 100, 1].iter().map(|n| record_file_name(*n)).collect();
        names.sort();
        let parsed: Vec<u64> = names.iter().filter_map(|n| parse_record_file_name(n)).collect();
        assert_eq!(parsed, vec![1, 2, 10, 100]);
    }

    #[test]
    fn test_parse_accepts_other_widths_and_rejects_junk() {
        assert_eq!(parse_record_file_name("proof-batch-0001.json"), Some(1));
        assert_eq!(parse_record_file_name("proof-batch-.json"), None);
        assert_eq!(parse_record_file_name("proof-batch-01.json.tmp"), None);
        assert_eq!(parse_record_file_name("proof-batch-+1.json"), None);
        assert_eq!(parse_record_file_name("notes.txt"), None);
    }

    #[test]
    fn test_write_then_read_is_lossless() {
        let dir = tempdir().unwrap();
        let store = ProofStore::create(dir.path().join("proofs")).unwrap();
        let records = fixtures::sample_records(30, 7);

        for record in &records {
            store.write(record).unwrap();
        }
        for record in &records {
            let read = store.read_batch(record.batch_number).unwrap();
            assert_eq!(&read, record);
        }
    }

    #[test]
    fn test_list_ordered_ignores_write_order() {
        let dir = tempdir().unwrap();
        let store = ProofStore::create(dir.path()).unwrap();
        let records = fixtures::sample_records(100, 9);

        for i in [5usize, 0, 10, 3, 1, 7, 2, 9, 4, 8, 6] {
            store.write(&records[i]).unwrap();
        }
        fs::write(dir.path().join("README.txt"), b"not a record").unwrap();

        let ids = store.list_ordered().unwrap();
        let numbers: Vec<u64> = ids.iter().map(|id| id.batch_number).collect();
        assert_eq!(numbers, (1..=11).collect::<Vec<u64>>());
    }

    #[test]
    fn test_records_are_immutable() {
        let dir = tempdir().unwrap();
        let store = ProofStore::create(dir.path()).unwrap();
        let records = fixtures::sample_records(10, 5);

        store.write(&records[0]).unwrap();
        let err = store.write(&records[0]).unwrap_err();
        assert!(matches!(err, StoreError::RecordExists { batch: 1, .. }));
    }

    #[test]
    fn test_write_failure_is_reported_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = ProofStore::create(dir.path().join("proofs")).unwrap();
        let records = fixtures::sample_records(10, 5);

        // Occupy the temp path with a directory so the create fails.
        let tmp_path = store.id_for(1).path.with_extension("json.tmp");
        fs::create_dir(&tmp_path).unwrap();
        assert!(matches!(store.write(&records[0]), Err(StoreError::Io { .. })));
        assert!(!store.id_for(1).path.exists());
        fs::remove_dir(&tmp_path).unwrap();

        // The store directory itself is gone and a regular file sits in its place.
        fs::remove_dir_all(store.dir()).unwrap();
        fs::write(store.dir(), b"not a directory").unwrap();
        assert!(matches!(store.write(&records[1]), Err(StoreError::Io { .. })));
        assert!(!store.id_for(2).path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_list_detects_gap_and_duplicate() {
        let dir = tempdir().unwrap();
        let store = ProofStore::create(dir.path()).unwrap();
        let records = fixtures::sample_records(30, 10);

        store.write(&records[0]).unwrap();
        store.write(&records[2]).unwrap();
        assert!(matches!(
            store.list_ordered(),
            Err(StoreError::MissingBatch { expected: 2, found: 3 })
        ));

        store.write(&records[1]).unwrap();
        fs::copy(store.id_for(1).path, dir.path().join("proof-batch-1.json")).unwrap();
        assert!(matches!(store.list_ordered(), Err(StoreError::DuplicateBatch { batch: 1, .. })));
    }

    #[test]
    fn test_read_missing_and_corrupt() {
        let dir = tempdir().unwrap();
        let store = ProofStore::create(dir.path()).unwrap();

        assert!(matches!(store.read_batch(4), Err(StoreError::NotFound(_))));

        fs::write(store.id_for(1).path, br#"{"batchNumber": 1}"#).unwrap();
        assert!(matches!(store.read_batch(1), Err(StoreError::CorruptRecord { .. })));

        let record = &fixtures::sample_records(10, 5)[1];
        let mut json = serde_json::to_value(record).unwrap();
        json["treeRoot"] = serde_json::Value::String("0xnothex".to_string());
        fs::write(store.id_for(2).path, serde_json::to_vec(&json).unwrap()).unwrap();
        assert!(matches!(store.read_batch(2), Err(StoreError::CorruptRecord { .. })));
    }

    #[test]
    fn test_read_rejects_overflowing_index_bounds() {
        let dir = tempdir().unwrap();
        let store = ProofStore::create(dir.path()).unwrap();
        let record = &fixtures::sample_records(10, 5)[0];

        let mut json = serde_json::to_value(record).unwrap();
        json["startIndex"] = serde_json::json!(0);
        json["endIndex"] = serde_json::json!(u64::MAX);
        fs::write(store.id_for(1).path, serde_json::to_vec(&json).unwrap()).unwrap();

        match store.read_batch(1) {
            Err(StoreError::CorruptRecord { reason, .. }) => assert_eq!(reason, "index bounds overflow"),
            other => panic!("expected corrupt record, got {:?}", other),
        }
    }

    #[test]
    fn test_read_rejects_misnamed_record() {
        let dir = tempdir().unwrap();
        let store = ProofStore::create(dir.path()).unwrap();
        let record = &fixtures::sample_records(10, 5)[0];

        fs::write(store.id_for(2).path, serde_json::to_vec(record).unwrap()).unwrap();
        assert!(matches!(store.read_batch(2), Err(StoreError::CorruptRecord { .. })));
    }

    #[test]
    fn test_open_requires_directory() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            ProofStore::open(dir.path().join("absent")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_digest_is_stable() {
        let dir = tempdir().unwrap();
        let store = ProofStore::create(dir.path()).unwrap();
        let id = store.write(&fixtures::sample_records(10, 5)[0]).unwrap();
        assert_eq!(store.digest(&id).unwrap(), store.digest(&id).unwrap());
    }
}
