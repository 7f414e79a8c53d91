//! On-disk storage for uploaded images, one directory per user.

use std::path::{Path, PathBuf};

use service_core::error::AppError;
use tokio::fs;

#[derive(Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn user_dir(&self, user_email: &str) -> PathBuf {
        self.root.join(user_email)
    }

    /// Persist image bytes under the user's directory with a timestamped
    /// name; returns the stored file's path.
    pub async fn save_image(&self, user_email: &str, image: &[u8]) -> Result<PathBuf, AppError> {
        let dir = self.user_dir(user_email);
        fs::create_dir_all(&dir).await.map_err(|e| {
            tracing::error!(dir = %dir.display(), error = %e, "Failed to create upload directory");
            AppError::InternalError(anyhow::anyhow!("Failed to create upload directory: {}", e))
        })?;

        let file_name = format!("image_{}.png", chrono::Utc::now().timestamp_millis());
        let path = dir.join(&file_name);
        fs::write(&path, image).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Failed to save image");
            AppError::InternalError(anyhow::anyhow!("Failed to save image: {}", e))
        })?;

        Ok(path)
    }

    /// File names stored for a user; empty when the directory does not
    /// exist yet.
    pub async fn list(&self, user_email: &str) -> Result<Vec<String>, AppError> {
        let dir = self.user_dir(user_email);
        if fs::metadata(&dir).await.is_err() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&dir).await.map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Unable to read upload directory: {}", e))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Unable to read upload directory: {}", e))
        })? {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
        files.sort();
        Ok(files)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_list_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let path = store.save_image("a@x.com", b"not-a-real-png").await.unwrap();
        assert!(path.exists());

        let files = store.list("a@x.com").await.unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("image_"));
    }

    #[tokio::test]
    async fn list_for_unknown_user_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        assert!(store.list("nobody@x.com").await.unwrap().is_empty());
    }
}
