//! Submission store: one JSON document per pending or rejected submission.
//!
//! Mutations of a single submission are serialized through a per-id async
//! mutex. Lock entries are dropped from the map once nobody holds or waits
//! on them, so the map only grows with in-flight work.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{persist_json, read_json, remove_document};
use crate::errors::AppError;
use crate::models::{NewSubmission, Submission};

/// Owner of all pending and rejected submission records.
pub struct SubmissionStore {
    dir: PathBuf,
    io_retries: u32,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SubmissionStore {
    /// Open the store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: &Path, io_retries: u32) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(Self {
            dir: dir.to_path_buf(),
            io_retries,
            locks: DashMap::new(),
        })
    }

    /// Persist a validated candidate as a fresh record.
    pub async fn create(&self, candidate: NewSubmission) -> Result<Submission, AppError> {
        let record = Submission::new(candidate);
        let path = self.dir.join(format!("{}.json", record.id));
        persist_json(&path, &record, self.io_retries).await?;
        Ok(record)
    }

    /// All records that have not been rejected, in submission order.
    pub async fn list(&self) -> Result<Vec<Submission>, AppError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut records = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            // Skip in-flight temp files and anything else that isn't a record
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                // Merged and deleted since the directory was read
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            match serde_json::from_slice::<Submission>(&bytes) {
                Ok(record) if !record.rejected => records.push(record),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping corrupt submission {:?}: {}", path, e),
            }
        }

        records.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }

    /// Fetch a record by id, rejected or not.
    pub async fn get(&self, id: &str) -> Result<Submission, AppError> {
        let (id, path) = self.resolve(id)?;
        read_json(&path)
            .await?
            .ok_or_else(|| AppError::submission_not_found(&id))
    }

    /// Remove a record. Removing an unknown id is a no-op.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        match self.lock(id).await {
            Ok(guard) => guard.remove().await,
            Err(AppError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Read-modify-write a record under its lock.
    ///
    /// The record is persisted only if `mutator` succeeds.
    pub async fn update<F>(&self, id: &str, mutator: F) -> Result<Submission, AppError>
    where
        F: FnOnce(&mut Submission) -> Result<(), AppError>,
    {
        let guard = self.lock(id).await?;
        let mut record = guard.load().await?;
        mutator(&mut record)?;
        guard.save(&record).await?;
        Ok(record)
    }

    /// Acquire exclusive access to one submission id.
    ///
    /// Callers queue in arrival order; nothing fails for lack of the lock.
    pub async fn lock(&self, id: &str) -> Result<SubmissionGuard<'_>, AppError> {
        let (id, path) = self.resolve(id)?;
        let lock = Arc::clone(
            self.locks
                .entry(id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        let guard = lock.lock_owned().await;

        Ok(SubmissionGuard {
            store: self,
            id,
            path,
            guard: Some(guard),
        })
    }

    /// Canonical id and document path. Anything that is not a UUID cannot exist.
    fn resolve(&self, id: &str) -> Result<(String, PathBuf), AppError> {
        let uuid = uuid::Uuid::try_parse(id).map_err(|_| AppError::submission_not_found(id))?;
        let id = uuid.to_string();
        let path = self.dir.join(format!("{}.json", id));
        Ok((id, path))
    }
}

/// Exclusive handle on a single submission id.
pub struct SubmissionGuard<'a> {
    store: &'a SubmissionStore,
    id: String,
    path: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SubmissionGuard<'_> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Load the record, failing with `NotFound` if it does not exist.
    pub async fn load(&self) -> Result<Submission, AppError> {
        read_json(&self.path)
            .await?
            .ok_or_else(|| AppError::submission_not_found(&self.id))
    }

    pub async fn save(&self, record: &Submission) -> Result<(), AppError> {
        persist_json(&self.path, record, self.store.io_retries).await
    }

    pub async fn remove(&self) -> Result<(), AppError> {
        remove_document(&self.path, self.store.io_retries).await
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.store
            .locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
