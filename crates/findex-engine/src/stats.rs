//! Corpus statistics.

use crate::store::{RecordStore, StoreAggregates};
use crate::EngineError;
use chrono::{DateTime, Utc};
use findex_core::FileCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Corpus-level aggregates, computed on demand from the record store.
///
/// Never cached: always reflects the store at call time, independent of
/// search index freshness.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusStats {
    /// Total record count
    pub total_files: u64,
    /// Total byte size of indexed files
    pub total_size: u64,
    /// Most recent `indexed_at`, or None when nothing is indexed
    pub last_indexed: Option<DateTime<Utc>>,
    /// Record count per category
    pub by_category: BTreeMap<FileCategory, u64>,
}

impl CorpusStats {
    /// Compute stats with a single pass over the store.
    pub async fn collect(store: &RecordStore) -> Result<Self, EngineError> {
        let StoreAggregates {
            total_files,
            total_size,
            last_indexed,
            by_category,
        } = store.aggregate().await?;

        Ok(Self {
            total_files,
            total_size,
            last_indexed,
            by_category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::IndexedRecord;
    use findex_core::FileDescriptor;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn descriptor(path: &str, size: u64, category: FileCategory) -> FileDescriptor {
        FileDescriptor {
            path: PathBuf::from(path),
            name: path.rsplit('/').next().unwrap().to_string(),
            extension: ".txt".to_string(),
            size,
            last_modified: Utc::now(),
            category,
        }
    }

    #[tokio::test]
    async fn test_empty_store_stats() {
        let temp = tempdir().unwrap();
        let store = RecordStore::open(temp.path().to_path_buf()).await.unwrap();

        let stats = CorpusStats::collect(&store).await.unwrap();
        assert_eq!(stats.total_files, 0);
        assert_eq!(stats.total_size, 0);
        assert_eq!(stats.last_indexed, None);
        assert!(stats.by_category.is_empty());
    }

    #[tokio::test]
    async fn test_stats_reflect_store_without_caching() {
        let temp = tempdir().unwrap();
        let store = RecordStore::open(temp.path().to_path_buf()).await.unwrap();

        store
            .upsert(IndexedRecord::from_descriptor(
                &descriptor("/a.txt", 100, FileCategory::Document),
                String::new(),
            ))
            .await
            .unwrap();

        let before = CorpusStats::collect(&store).await.unwrap();
        assert_eq!(before.total_files, 1);

        store
            .upsert(IndexedRecord::from_descriptor(
                &descriptor("/b.png", 50, FileCategory::Image),
                String::new(),
            ))
            .await
            .unwrap();

        let after = CorpusStats::collect(&store).await.unwrap();
        assert_eq!(after.total_files, 2);
        assert_eq!(after.total_size, 150);
        assert_eq!(after.by_category[&FileCategory::Document], 1);
        assert_eq!(after.by_category[&FileCategory::Image], 1);
        assert!(after.last_indexed.is_some());
    }
}
