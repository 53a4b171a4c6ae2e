//! Profile picture storage: validated save, public URL mapping, and cleanup
//! of replaced or deleted pictures.

use crate::error::AppError;
use crate::model::profile::PLACEHOLDER_PICTURE_URL;
use rand::Rng;
use std::path::{Path, PathBuf};

/// Upload size cap, enforced by the request body limit layer on the API
/// router. Kept here so the router and the docs agree on one number.
pub const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "webp"];

/// A picture part read out of a multipart form.
#[derive(Debug, Clone)]
pub struct PictureFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Stores pictures under one directory and maps them to `/uploads/<name>`
/// URLs on the public base URL.
#[derive(Debug, Clone)]
pub struct PictureStore {
    dir: PathBuf,
    public_base_url: String,
}

impl PictureStore {
    pub fn new(dir: &Path, public_base_url: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create the storage directory when missing.
    pub async fn ensure_dir(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Write the picture under a generated unique name and return its public
    /// URL. Rejects files whose extension is not an allowed image type.
    pub async fn save(&self, picture: &PictureFile) -> Result<String, AppError> {
        let ext = allowed_extension(&picture.file_name).ok_or_else(|| {
            AppError::Validation("only jpeg, jpg, png and webp images are allowed".into())
        })?;
        let name = unique_name(ext);
        tokio::fs::write(self.dir.join(&name), &picture.bytes).await?;
        tracing::debug!(name, size = picture.bytes.len(), "stored picture");
        Ok(format!("{}/uploads/{}", self.public_base_url, name))
    }

    /// Delete the stored file behind a picture URL. The placeholder is never
    /// touched and an already-missing file is not an error.
    pub async fn delete_by_url(&self, picture_url: &str) {
        if picture_url.is_empty() || picture_url.ends_with(PLACEHOLDER_PICTURE_URL) {
            return;
        }
        let Some(file_name) = picture_url.rsplit('/').next().filter(|n| !n.is_empty()) else {
            return;
        };
        // The URL's file name component is server-generated; still, refuse
        // anything that could escape the uploads directory.
        if file_name.contains("..") {
            return;
        }
        let path = self.dir.join(file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(?path, "deleted picture"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(?path, error = %e, "failed to delete picture"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn allowed_extension(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .find(|allowed| **allowed == ext)
        .copied()
}

/// Millisecond timestamp plus a random suffix, mirroring how the dashboard's
/// previous backend named uploads.
fn unique_name(ext: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{}-{}.{}", millis, suffix, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn extension_whitelist() {
        assert_eq!(allowed_extension("me.JPG"), Some("jpg"));
        assert_eq!(allowed_extension("grad photo.webp"), Some("webp"));
        assert_eq!(allowed_extension("script.svg"), None);
        assert_eq!(allowed_extension("noext"), None);
    }

    #[test]
    fn unique_names_keep_extension_and_differ() {
        let a = unique_name("png");
        let b = unique_name("png");
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn save_writes_file_and_returns_public_url() {
        let dir = tempdir().unwrap();
        let store = PictureStore::new(dir.path(), "http://localhost:3001");
        let url = store
            .save(&PictureFile {
                file_name: "grad.png".into(),
                bytes: vec![1, 2, 3],
            })
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:3001/uploads/"));
        let name = url.rsplit('/').next().unwrap();
        let written = tokio::fs::read(dir.path().join(name)).await.unwrap();
        assert_eq!(written, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn save_rejects_disallowed_extension() {
        let dir = tempdir().unwrap();
        let store = PictureStore::new(dir.path(), "http://localhost:3001");
        let err = store
            .save(&PictureFile {
                file_name: "payload.exe".into(),
                bytes: vec![0],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_removes_stored_file() {
        let dir = tempdir().unwrap();
        let store = PictureStore::new(dir.path(), "http://localhost:3001");
        let url = store
            .save(&PictureFile {
                file_name: "grad.jpg".into(),
                bytes: vec![9],
            })
            .await
            .unwrap();
        store.delete_by_url(&url).await;
        let name = url.rsplit('/').next().unwrap();
        assert!(!dir.path().join(name).exists());
    }

    #[tokio::test]
    async fn delete_skips_placeholder_and_missing_files() {
        let dir = tempdir().unwrap();
        let store = PictureStore::new(dir.path(), "http://localhost:3001");
        // Neither call may panic or error.
        store.delete_by_url(PLACEHOLDER_PICTURE_URL).await;
        store
            .delete_by_url("http://localhost:3001/uploads/gone.png")
            .await;
    }
}
