//! Canonical index store and dedup merger.
//!
//! The index document is cached in memory behind a single async mutex, which
//! is the only write path. The cache is replaced only after the new document
//! has been persisted, so a failed write leaves both disk and memory intact.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::Mutex;

use super::{persist_json, read_json};
use crate::errors::AppError;
use crate::models::{MergeOutcome, SiteEntry, SiteIndex};

/// Owner of the canonical, versioned `sites.json` document.
pub struct IndexStore {
    path: PathBuf,
    io_retries: u32,
    current: Mutex<SiteIndex>,
}

impl IndexStore {
    /// Open the index at `path`, creating an empty version-1 document if none exists.
    pub async fn open(path: &Path, io_retries: u32) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let index = match read_json::<SiteIndex>(path).await? {
            Some(index) => index,
            None => {
                let index = SiteIndex::initial();
                persist_json(path, &index, io_retries).await?;
                tracing::info!("Initialized empty index at {:?}", path);
                index
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            io_retries,
            current: Mutex::new(index),
        })
    }

    /// A copy of the current index document.
    pub async fn snapshot(&self) -> SiteIndex {
        self.current.lock().await.clone()
    }

    /// The current index version.
    pub async fn version(&self) -> u64 {
        self.current.lock().await.version
    }

    /// Append `site` unless its url is already listed.
    ///
    /// Urls are compared by exact string equality. A duplicate leaves version,
    /// sites and `last_updated` untouched and is reported as
    /// [`MergeOutcome::DuplicateMerge`].
    pub async fn merge(&self, site: SiteEntry) -> Result<MergeOutcome, AppError> {
        let mut current = self.current.lock().await;

        if current.contains_url(&site.url) {
            tracing::info!("Duplicate merge skipped: {} ({})", site.name, site.url);
            return Ok(MergeOutcome::DuplicateMerge {
                version: current.version,
            });
        }

        let mut next = current.clone();
        let name = site.name.clone();
        next.sites.push(site);
        next.version += 1;
        next.last_updated = Utc::now();

        persist_json(&self.path, &next, self.io_retries).await?;

        let version = next.version;
        *current = next;
        tracing::info!("Merged: {} (index version {})", name, version);

        Ok(MergeOutcome::Merged { version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn site(url: &str) -> SiteEntry {
        SiteEntry {
            name: "Example".to_string(),
            url: url.to_string(),
            description: "d".to_string(),
            tags: BTreeSet::from(["i2p".to_string()]),
        }
    }

    #[tokio::test]
    async fn test_open_creates_initial_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("sites.json");

        let store = IndexStore::open(&path, 1).await.unwrap();
        assert!(path.exists());

        let index = store.snapshot().await;
        assert_eq!(index.version, 1);
        assert!(index.sites.is_empty());
    }

    #[tokio::test]
    async fn test_merge_appends_and_bumps_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sites.json");
        let store = IndexStore::open(&path, 1).await.unwrap();

        let outcome = store.merge(site("http://a.i2p")).await.unwrap();
        assert_eq!(outcome, MergeOutcome::Merged { version: 2 });

        // Reopening reads the persisted document
        let reopened = IndexStore::open(&path, 1).await.unwrap();
        let index = reopened.snapshot().await;
        assert_eq!(index.version, 2);
        assert_eq!(index.sites, vec![site("http://a.i2p")]);
    }

    #[tokio::test]
    async fn test_duplicate_merge_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::open(&dir.path().join("sites.json"), 1)
            .await
            .unwrap();

        store.merge(site("http://a.i2p")).await.unwrap();
        let before = store.snapshot().await;

        let outcome = store.merge(site("http://a.i2p")).await.unwrap();
        assert_eq!(outcome, MergeOutcome::DuplicateMerge { version: 2 });
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_url_match_is_exact() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::open(&dir.path().join("sites.json"), 1)
            .await
            .unwrap();

        store.merge(site("http://a.i2p")).await.unwrap();
        let outcome = store.merge(site("http://a.i2p/")).await.unwrap();
        assert_eq!(outcome, MergeOutcome::Merged { version: 3 });
        let outcome = store.merge(site("HTTP://A.I2P")).await.unwrap();
        assert_eq!(outcome, MergeOutcome::Merged { version: 4 });
    }

    #[tokio::test]
    async fn test_failed_write_leaves_index_unchanged() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        let store = IndexStore::open(&data_dir.join("sites.json"), 2)
            .await
            .unwrap();

        std::fs::remove_dir_all(&data_dir).unwrap();

        let err = store.merge(site("http://a.i2p")).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));

        let index = store.snapshot().await;
        assert_eq!(index.version, 1);
        assert!(index.sites.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_merges_of_same_url() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            IndexStore::open(&dir.path().join("sites.json"), 1)
                .await
                .unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.merge(site("http://a.i2p")).await.unwrap() })
            })
            .collect();

        let mut merged = 0;
        for handle in handles {
            if let MergeOutcome::Merged { .. } = handle.await.unwrap() {
                merged += 1;
            }
        }

        assert_eq!(merged, 1);
        let index = store.snapshot().await;
        assert_eq!(index.version, 2);
        assert_eq!(index.sites.len(), 1);
    }
}
