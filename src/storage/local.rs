//! Directory-backed store: a container is a directory, an identity is a file path.

use std::fs;
use std::path::Path;

use super::{RemoteStore, RetryPolicy, StoreError};
use crate::RemoteId;

#[derive(Clone, Debug, Default)]
pub struct LocalStore {
    retry: RetryPolicy,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(retry: RetryPolicy) -> Self {
        Self { retry }
    }
}

impl RemoteStore for LocalStore {
    fn list(&self, container: &RemoteId) -> Result<Vec<RemoteId>, StoreError> {
        let dir = container.as_path();
        if !dir.is_dir() {
            return Err(StoreError::NotFound(container.clone()));
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() {
                return Err(StoreError::NotImplemented(format!(
                    "collection {} found; sub-collections are not supported",
                    container.join(&name)
                )));
            }
            ids.push(container.join(&name));
        }
        ids.sort();
        Ok(ids)
    }

    fn fetch(&self, id: &RemoteId, local: &Path, tries: usize) -> Result<(), StoreError> {
        self.retry
            .run(tries, || fs::copy(id.as_path(), local).map(|_| ()))
    }

    fn store(&self, id: &RemoteId, local: &Path, tries: usize) -> Result<(), StoreError> {
        self.retry
            .run(tries, || fs::copy(local, id.as_path()).map(|_| ()))
    }

    fn exists(&self, id: &RemoteId) -> bool {
        id.as_path().exists()
    }
}
