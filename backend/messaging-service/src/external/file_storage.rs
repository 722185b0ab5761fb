//! Client for the file storage service. The messaging core only ever reads
//! file metadata; bytes live elsewhere.

use crate::domain::{FileId, FileMeta};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileStorageError {
    #[error("file not found")]
    FileNotFound,

    #[error("file storage unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn get_by_id(&self, file_id: FileId) -> Result<FileMeta, FileStorageError>;
}

/// Map-backed stand-in used by the dev binary and tests.
#[derive(Default)]
pub struct InMemoryFileStorage {
    files: RwLock<HashMap<FileId, FileMeta>>,
}

impl InMemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, file: FileMeta) {
        self.files.write().await.insert(file.file_id, file);
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn get_by_id(&self, file_id: FileId) -> Result<FileMeta, FileStorageError> {
        self.files
            .read()
            .await
            .get(&file_id)
            .cloned()
            .ok_or(FileStorageError::FileNotFound)
    }
}
