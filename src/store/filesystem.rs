// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Filesystem-based document store
//!
//! Stores each document as `<root>/<key>.json`. The revision of a document
//! is the BLAKE3 hash of its bytes. The compare-and-write holds an
//! exclusive `<root>/.<key>.lock` file, created with `create_new`, so
//! writers in other processes and other store instances sharing the root
//! are serialised too.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use super::{DocumentStore, Revision, StoredDocument, WriteOutcome};
use crate::errors::{JetflowError, JetflowResult};

/// Lock files older than this were left behind by a writer that died
const STALE_LOCK_AFTER: Duration = Duration::from_secs(10);

/// Pause between attempts to take a held lock
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(5);

/// Filesystem-backed [`DocumentStore`]
pub struct FilesystemStore {
    /// Directory holding the documents
    root: PathBuf,
    /// Queues writers of this instance before they contend for the lock file
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Exclusive hold on one document, released when dropped
struct DocumentLock {
    path: PathBuf,
}

impl DocumentLock {
    async fn acquire(path: PathBuf) -> JetflowResult<Self> {
        loop {
            let created = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match created {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if Self::is_stale(&path).await {
                        tracing::warn!(lock = %path.display(), "Removing stale document lock");
                        let _ = tokio::fs::remove_file(&path).await;
                        continue;
                    }
                    tokio::time::sleep(LOCK_RETRY_DELAY).await;
                }
                Err(e) => {
                    return Err(JetflowError::store(
                        &format!("lock '{}'", path.display()),
                        e,
                    ))
                }
            }
        }
    }

    async fn is_stale(path: &Path) -> bool {
        match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(modified) => modified
                .elapsed()
                .is_ok_and(|age| age > STALE_LOCK_AFTER),
            Err(_) => false,
        }
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

impl FilesystemStore {
    /// Create a new store, creating the root directory if needed
    pub fn new(root: PathBuf) -> JetflowResult<Self> {
        if !root.exists() {
            std::fs::create_dir_all(&root).map_err(|e| {
                JetflowError::store(
                    &format!("create data directory '{}'", root.display()),
                    e,
                )
            })?;
        }

        Ok(Self {
            root,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn validate_key(key: &str) -> JetflowResult<()> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid {
            return Err(JetflowError::store("resolve document", format!("invalid key '{}'", key)));
        }

        Ok(())
    }

    /// Get path for a document
    fn document_path(&self, key: &str) -> JetflowResult<PathBuf> {
        Self::validate_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.root.join(format!(".{}.lock", key))
    }

    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    fn revision_of(bytes: &[u8]) -> Revision {
        Revision::new(blake3::hash(bytes).to_hex().to_string())
    }

    async fn read_bytes(path: &Path) -> JetflowResult<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(JetflowError::store(
                &format!("read '{}'", path.display()),
                e,
            )),
        }
    }

    /// Compare the on-disk revision and replace the document atomically.
    ///
    /// Must run while the document lock is held.
    fn compare_and_replace(
        root: &Path,
        path: &Path,
        bytes: &[u8],
        expected: Option<&Revision>,
    ) -> JetflowResult<WriteOutcome> {
        let current = match std::fs::read(path) {
            Ok(existing) => Some(Self::revision_of(&existing)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(JetflowError::store(
                    &format!("read '{}'", path.display()),
                    e,
                ))
            }
        };

        if current.as_ref() != expected {
            return Ok(WriteOutcome::Conflict);
        }

        // Readers never see a partial document
        let mut tmp = NamedTempFile::new_in(root).map_err(|e| {
            JetflowError::store(&format!("create temp file in '{}'", root.display()), e)
        })?;

        tmp.write_all(bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| JetflowError::store(&format!("write '{}'", tmp.path().display()), e))?;

        tmp.persist(path)
            .map_err(|e| JetflowError::store(&format!("replace '{}'", path.display()), e.error))?;

        Ok(WriteOutcome::Written(Self::revision_of(bytes)))
    }
}

#[async_trait]
impl DocumentStore for FilesystemStore {
    async fn read(&self, key: &str) -> JetflowResult<Option<StoredDocument>> {
        let path = self.document_path(key)?;

        Ok(Self::read_bytes(&path).await?.map(|bytes| StoredDocument {
            revision: Self::revision_of(&bytes),
            bytes,
        }))
    }

    async fn write(
        &self,
        key: &str,
        bytes: Vec<u8>,
        expected: Option<&Revision>,
    ) -> JetflowResult<WriteOutcome> {
        let path = self.document_path(key)?;
        let local = self.lock_for(key).await;
        let _local = local.lock().await;

        let lock = DocumentLock::acquire(self.lock_path(key)).await?;

        // The lock moves into the blocking task so it is held until the
        // rename finishes even if this future is dropped
        let root = self.root.clone();
        let expected = expected.cloned();
        tokio::task::spawn_blocking(move || {
            let _lock = lock;
            Self::compare_and_replace(&root, &path, &bytes, expected.as_ref())
        })
        .await
        .map_err(|e| JetflowError::store("join write task", e))?
    }

    async fn ping(&self) -> JetflowResult<()> {
        let metadata = tokio::fs::metadata(&self.root).await.map_err(|e| {
            JetflowError::store(&format!("access '{}'", self.root.display()), e)
        })?;

        if !metadata.is_dir() {
            return Err(JetflowError::store(
                "ping",
                format!("'{}' is not a directory", self.root.display()),
            ));
        }

        if metadata.permissions().readonly() {
            return Err(JetflowError::store(
                "ping",
                format!("'{}' is read-only", self.root.display()),
            ));
        }

        Ok(())
    }
}
