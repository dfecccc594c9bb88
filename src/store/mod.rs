//! File-backed persistence.
//!
//! Every document is a pretty-printed JSON file replaced atomically
//! (temp file in the same directory, then rename). Readers therefore never
//! observe a half-written document.

mod index;
mod submissions;

pub use index::*;
pub use submissions::*;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::AppError;

/// Base delay between write attempts; multiplied by the attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Serialize `value` and atomically replace `path` with it.
///
/// The write is attempted up to `attempts` times before the last I/O error
/// is surfaced as [`AppError::Storage`].
pub(crate) async fn persist_json<T: Serialize>(
    path: &Path,
    value: &T,
    attempts: u32,
) -> Result<(), AppError> {
    let data: Arc<[u8]> = serde_json::to_vec_pretty(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize {}: {}", path.display(), e)))?
        .into();

    retry_io(attempts, path, || {
        let target = path.to_path_buf();
        let data = Arc::clone(&data);
        async move { tokio::task::spawn_blocking(move || atomic_write(&target, &data)).await? }
    })
    .await
}

/// Remove `path`; a missing file is not an error.
pub(crate) async fn remove_document(path: &Path, attempts: u32) -> Result<(), AppError> {
    retry_io(attempts, path, || async move {
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other.map_err(AppError::from),
        }
    })
    .await
}

/// Read and decode a JSON document. `Ok(None)` if the file does not exist.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, AppError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        tracing::error!("Corrupt document {}: {}", path.display(), e);
        AppError::Storage(format!("Corrupt document {}: {}", path.display(), e))
    })
}

async fn retry_io<F, Fut>(attempts: u32, path: &Path, mut op: F) -> Result<(), AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<(), AppError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(()) => return Ok(()),
            Err(AppError::Storage(msg)) if attempt < attempts => {
                tracing::warn!(
                    "Write to {} failed (attempt {}/{}): {}",
                    path.display(),
                    attempt,
                    attempts,
                    msg
                );
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AppError> {
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_persist_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");

        persist_json(&path, &json!({ "a": 1 }), 1).await.unwrap();
        persist_json(&path, &json!({ "a": 2 }), 1).await.unwrap();

        let doc: Value = read_json(&path).await.unwrap().unwrap();
        assert_eq!(doc["a"], 2);

        // No temp files are left behind
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let doc: Option<Value> = read_json(&dir.path().join("nope.json")).await.unwrap();
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let err = read_json::<Value>(&path).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[tokio::test]
    async fn test_write_failure_surfaces_after_retries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("doc.json");

        let err = persist_json(&path, &json!({}), 2).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_is_noop() {
        let dir = TempDir::new().unwrap();
        remove_document(&dir.path().join("gone.json"), 1)
            .await
            .unwrap();
    }
}
