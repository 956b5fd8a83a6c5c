//! Durable record store.
//!
//! One MessagePack file per record, named by a hash of the record's
//! path. Upserts are atomic (temp write + rename), so a concurrent
//! scan observes either the old or the new record, never a torn one.

use crate::record::IndexedRecord;
use crate::EngineError;
use chrono::{DateTime, Utc};
use findex_core::FileCategory;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Aggregates computed in a single pass over the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreAggregates {
    /// Number of records
    pub total_files: u64,
    /// Sum of record sizes in bytes
    pub total_size: u64,
    /// Most recent `indexed_at`, or None when the store is empty
    pub last_indexed: Option<DateTime<Utc>>,
    /// Record count per category
    pub by_category: BTreeMap<FileCategory, u64>,
}

/// Keyed durable storage of one record per file path.
pub struct RecordStore {
    dir: PathBuf,
    next_seq: AtomicU64,
}

impl RecordStore {
    /// Open (or create) a store rooted at `dir`.
    ///
    /// The insertion sequence resumes from the highest `seq` observed
    /// in existing records, so tie ordering survives restarts.
    pub async fn open(dir: PathBuf) -> Result<Self, EngineError> {
        tokio::fs::create_dir_all(&dir).await?;

        let store = Self {
            dir,
            next_seq: AtomicU64::new(1),
        };

        let max_seq = store
            .read_all()
            .await?
            .iter()
            .map(|r| r.seq)
            .max()
            .unwrap_or(0);
        store.next_seq.store(max_seq + 1, Ordering::SeqCst);

        debug!(dir = ?store.dir, next_seq = max_seq + 1, "Record store opened");

        Ok(store)
    }

    /// Compute the file key for a record path.
    fn record_key(path: &Path) -> String {
        let mut hasher = Sha256::new();
        hasher.update(path.to_string_lossy().as_bytes());
        let result = hasher.finalize();
        format!("{:x}", result)[..16].to_string()
    }

    fn record_file(&self, path: &Path) -> PathBuf {
        self.dir.join(format!("{}.msgpack", Self::record_key(path)))
    }

    /// Insert or replace the record keyed by its path.
    ///
    /// A replacement keeps the prior record's `seq` so re-ingestion
    /// refreshes recency through `indexed_at` without perturbing tie
    /// order. Readers never observe a half-written record.
    pub async fn upsert(&self, mut record: IndexedRecord) -> Result<(), EngineError> {
        let file = self.record_file(&record.path);

        record.seq = match self.read_one(&file).await {
            Some(existing) => existing.seq,
            None => self.next_seq.fetch_add(1, Ordering::SeqCst),
        };

        let data = rmp_serde::to_vec(&record)?;

        // Atomic write: temp file in the same directory, then rename
        let temp = self
            .dir
            .join(format!(".{}.tmp", Self::record_key(&record.path)));
        tokio::fs::write(&temp, &data)
            .await
            .map_err(|e| EngineError::Storage(format!("write {}: {}", temp.display(), e)))?;
        tokio::fs::rename(&temp, &file)
            .await
            .map_err(|e| EngineError::Storage(format!("rename {}: {}", file.display(), e)))?;

        debug!(path = ?record.path, seq = record.seq, "Record upserted");

        Ok(())
    }

    /// Return every record, most recently indexed first (ties broken
    /// by insertion order, newest first).
    pub async fn scan_all(&self) -> Result<Vec<IndexedRecord>, EngineError> {
        let mut records = self.read_all().await?;
        records.sort_by(|a, b| {
            b.indexed_at
                .cmp(&a.indexed_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        Ok(records)
    }

    /// Remove all records. All-or-nothing: the directory is dropped
    /// and recreated; failure leaves the store untouched or empty.
    pub async fn clear(&self) -> Result<(), EngineError> {
        tokio::fs::remove_dir_all(&self.dir)
            .await
            .map_err(|e| EngineError::Storage(format!("clear: {}", e)))?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| EngineError::Storage(format!("clear: {}", e)))?;
        self.next_seq.store(1, Ordering::SeqCst);

        debug!(dir = ?self.dir, "Record store cleared");

        Ok(())
    }

    /// Count, total size, newest `indexed_at`, and per-category counts,
    /// computed in one pass. This storage engine has no server-side
    /// aggregation, so the pass reads every record.
    pub async fn aggregate(&self) -> Result<StoreAggregates, EngineError> {
        let mut agg = StoreAggregates::default();

        for record in self.read_all().await? {
            agg.total_files += 1;
            agg.total_size += record.size;
            agg.last_indexed = match agg.last_indexed {
                Some(ts) if ts >= record.indexed_at => Some(ts),
                _ => Some(record.indexed_at),
            };
            *agg.by_category.entry(record.category).or_insert(0) += 1;
        }

        Ok(agg)
    }

    async fn read_one(&self, file: &Path) -> Option<IndexedRecord> {
        let data = match tokio::fs::read(file).await {
            Ok(data) => data,
            // Absent is the normal case when upsert looks for a record
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(file = ?file, error = %e, "Skipping unreadable record");
                return None;
            }
        };
        match rmp_serde::from_slice(&data) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(file = ?file, error = %e, "Skipping undecodable record");
                None
            }
        }
    }

    async fn read_all(&self) -> Result<Vec<IndexedRecord>, EngineError> {
        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("msgpack") {
                continue;
            }
            if let Some(record) = self.read_one(&path).await {
                records.push(record);
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use findex_core::FileDescriptor;
    use tempfile::tempdir;

    fn record(path: &str, content: &str) -> IndexedRecord {
        let descriptor = FileDescriptor {
            path: PathBuf::from(path),
            name: Path::new(path)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .to_string(),
            extension: ".txt".to_string(),
            size: content.len() as u64,
            last_modified: Utc::now(),
            category: FileCategory::Document,
        };
        IndexedRecord::from_descriptor(&descriptor, content.to_string())
    }

    #[tokio::test]
    async fn test_upsert_and_scan() {
        let temp = tempdir().unwrap();
        let store = RecordStore::open(temp.path().to_path_buf()).await.unwrap();

        store.upsert(record("/a.txt", "alpha")).await.unwrap();
        store.upsert(record("/b.txt", "beta")).await.unwrap();

        let all = store.scan_all().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_by_path() {
        let temp = tempdir().unwrap();
        let store = RecordStore::open(temp.path().to_path_buf()).await.unwrap();

        let first = record("/a.txt", "old content");
        store.upsert(first.clone()).await.unwrap();

        let mut second = record("/a.txt", "new content");
        second.indexed_at = first.indexed_at + Duration::seconds(5);
        store.upsert(second).await.unwrap();

        let all = store.scan_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "new content");
        assert!(all[0].indexed_at > first.indexed_at);
    }

    #[tokio::test]
    async fn test_replacement_keeps_seq() {
        let temp = tempdir().unwrap();
        let store = RecordStore::open(temp.path().to_path_buf()).await.unwrap();

        store.upsert(record("/a.txt", "one")).await.unwrap();
        let seq_before = store.scan_all().await.unwrap()[0].seq;

        store.upsert(record("/a.txt", "two")).await.unwrap();
        let seq_after = store.scan_all().await.unwrap()[0].seq;

        assert_eq!(seq_before, seq_after);
    }

    #[tokio::test]
    async fn test_scan_orders_most_recent_first() {
        let temp = tempdir().unwrap();
        let store = RecordStore::open(temp.path().to_path_buf()).await.unwrap();

        let base = Utc::now();
        let mut older = record("/old.txt", "old");
        older.indexed_at = base - Duration::seconds(60);
        let mut newer = record("/new.txt", "new");
        newer.indexed_at = base;

        store.upsert(older).await.unwrap();
        store.upsert(newer).await.unwrap();

        let all = store.scan_all().await.unwrap();
        assert_eq!(all[0].name, "new.txt");
        assert_eq!(all[1].name, "old.txt");
    }

    #[tokio::test]
    async fn test_equal_timestamps_break_ties_by_insertion() {
        let temp = tempdir().unwrap();
        let store = RecordStore::open(temp.path().to_path_buf()).await.unwrap();

        let ts = Utc::now();
        let mut first = record("/first.txt", "1");
        first.indexed_at = ts;
        let mut second = record("/second.txt", "2");
        second.indexed_at = ts;

        store.upsert(first).await.unwrap();
        store.upsert(second).await.unwrap();

        let all = store.scan_all().await.unwrap();
        assert_eq!(all[0].name, "second.txt");
        assert_eq!(all[1].name, "first.txt");
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let temp = tempdir().unwrap();
        let store = RecordStore::open(temp.path().to_path_buf()).await.unwrap();

        store.upsert(record("/a.txt", "alpha")).await.unwrap();
        store.clear().await.unwrap();

        assert!(store.scan_all().await.unwrap().is_empty());
        let agg = store.aggregate().await.unwrap();
        assert_eq!(agg.total_files, 0);
        assert_eq!(agg.last_indexed, None);
    }

    #[tokio::test]
    async fn test_aggregate() {
        let temp = tempdir().unwrap();
        let store = RecordStore::open(temp.path().to_path_buf()).await.unwrap();

        store.upsert(record("/a.txt", "alpha")).await.unwrap();
        store.upsert(record("/b.txt", "beta!")).await.unwrap();

        let agg = store.aggregate().await.unwrap();
        assert_eq!(agg.total_files, 2);
        assert_eq!(agg.total_size, 10);
        assert!(agg.last_indexed.is_some());
        assert_eq!(agg.by_category[&FileCategory::Document], 2);
    }

    #[tokio::test]
    async fn test_sequence_survives_reopen() {
        let temp = tempdir().unwrap();

        {
            let store = RecordStore::open(temp.path().to_path_buf()).await.unwrap();
            store.upsert(record("/a.txt", "alpha")).await.unwrap();
            store.upsert(record("/b.txt", "beta")).await.unwrap();
        }

        let store = RecordStore::open(temp.path().to_path_buf()).await.unwrap();
        store.upsert(record("/c.txt", "gamma")).await.unwrap();

        let mut seqs: Vec<u64> = store.scan_all().await.unwrap().iter().map(|r| r.seq).collect();
        seqs.sort_unstable();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_skipped() {
        let temp = tempdir().unwrap();
        let store = RecordStore::open(temp.path().to_path_buf()).await.unwrap();

        store.upsert(record("/a.txt", "alpha")).await.unwrap();
        tokio::fs::write(temp.path().join("deadbeefdeadbeef.msgpack"), b"not msgpack")
            .await
            .unwrap();

        let all = store.scan_all().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_record_is_skipped() {
        let temp = tempdir().unwrap();
        let store = RecordStore::open(temp.path().to_path_buf()).await.unwrap();

        store.upsert(record("/a.txt", "alpha")).await.unwrap();
        // A directory where a record file should be makes the read
        // itself fail, not just the decode
        tokio::fs::create_dir(temp.path().join("deadbeefdeadbeef.msgpack"))
            .await
            .unwrap();

        let all = store.scan_all().await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
