use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    ports::file_storage::{FileStorage, Upload},
};

/// Public disk on the local filesystem, served under `url_prefix`.
#[derive(Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
    url_prefix: String,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix: String = url_prefix.into();
        Self {
            root: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Rejects absolute paths and `..` so callers cannot escape the root.
    fn resolve(&self, relative: &str) -> AppResult<PathBuf> {
        let rel = Path::new(relative);
        let safe = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || relative.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Invalid storage path: {relative}"
            )));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl FileStorage for LocalDiskStorage {
    async fn put(&self, dir: &str, upload: &Upload) -> AppResult<String> {
        let relative = format!("{dir}/{}.{}", Uuid::new_v4(), upload.extension());
        let target = self.resolve(&relative)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Internal(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        tokio::fs::write(&target, &upload.bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write {relative}: {e}")))?;

        tracing::debug!(path = %relative, bytes = upload.bytes.len(), "Stored upload");
        Ok(relative)
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!("Failed to delete {path}: {e}"))),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.url_prefix, path.trim_start_matches('/'))
    }
}
