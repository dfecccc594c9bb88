//! Canonical site index model, stored as `sites.json`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single accepted directory entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteEntry {
    pub name: String,
    pub url: String,
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// The versioned, deduplicated list of accepted sites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteIndex {
    pub version: u64,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
}

impl SiteIndex {
    /// An empty index at version 1.
    pub fn initial() -> Self {
        Self {
            version: 1,
            last_updated: Utc::now(),
            sites: Vec::new(),
        }
    }

    /// Exact-match lookup by url.
    pub fn contains_url(&self, url: &str) -> bool {
        self.sites.iter().any(|s| s.url == url)
    }
}
