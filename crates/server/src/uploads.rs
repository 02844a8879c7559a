//! Disk-backed storage for uploaded material images.
//!
//! Files land in a single flat directory named `<millisecond-timestamp><ext>`
//! and are served back read-only under [`PUBLIC_PREFIX`]. Nothing is ever
//! removed from the directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// URL prefix the upload directory is mounted at.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Multipart field carrying the image file.
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Write `bytes` under a fresh timestamped name and return the public path.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> std::io::Result<String> {
        let ext = extension_of(original_name);
        let mut stamp = chrono::Utc::now().timestamp_millis();

        loop {
            let filename = format!("{stamp}{ext}");
            let path = self.dir.join(&filename);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    tracing::debug!(file = %path.display(), size = bytes.len(), "stored upload");
                    return Ok(public_path(&filename));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => stamp += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Public URL path for a stored file name.
pub fn public_path(filename: &str) -> String {
    format!("{PUBLIC_PREFIX}/{filename}")
}

/// Extension of the last path segment including its dot, or `""`.
///
/// Leading dots do not start an extension (`.bashrc` has none), and a
/// trailing dot counts as an empty extension (`a.` yields `"."`).
pub fn extension_of(name: &str) -> &str {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    match base.rfind('.') {
        Some(i) if base[..i].chars().all(|c| c == '.') => "",
        Some(i) => &base[i..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_rules() {
        assert_eq!(extension_of("photo.png"), ".png");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".bashrc"), "");
        assert_eq!(extension_of("a."), ".");
        assert_eq!(extension_of("../../etc/passwd.txt"), ".txt");
        assert_eq!(extension_of("dir.d/file"), "");
    }

    #[tokio::test]
    async fn save_writes_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadStore::new(dir.path());

        let url = uploads.save("cube.jpg", b"jpeg-bytes").await.unwrap();
        let filename = url.strip_prefix("/uploads/").expect("public prefix");
        let stamp = filename.strip_suffix(".jpg").expect("original extension");
        assert!(stamp.parse::<i64>().is_ok());

        let stored = tokio::fs::read(dir.path().join(filename)).await.unwrap();
        assert_eq!(stored, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn same_millisecond_uploads_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadStore::new(dir.path());

        let first = uploads.save("a.png", b"one").await.unwrap();
        let second = uploads.save("b.png", b"two").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn ensure_dir_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadStore::new(dir.path().join("nested").join("uploads"));
        uploads.ensure_dir().await.unwrap();
        assert!(uploads.dir().is_dir());
    }
}
