use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::DownloadError;

/// Lets the user choose where a file goes (`showSaveFilePicker` style).
#[async_trait]
pub trait SaveFilePicker: Send + Sync {
    /// Rejects with `PermissionDenied` when the user dismisses the picker or
    /// the chosen location cannot be written.
    async fn show_save_file_picker(
        &self,
        suggested_name: &str,
    ) -> Result<Box<dyn WritableFile>, DownloadError>;
}

#[async_trait]
pub trait WritableFile: Send {
    async fn write(&mut self, data: &[u8]) -> io::Result<()>;

    async fn close(&mut self) -> io::Result<()>;

    /// Discard whatever was written so far.
    async fn abort(&mut self);
}

/// Native save dialog
#[derive(Debug, Default)]
pub struct RfdSavePicker;

#[async_trait]
impl SaveFilePicker for RfdSavePicker {
    async fn show_save_file_picker(
        &self,
        suggested_name: &str,
    ) -> Result<Box<dyn WritableFile>, DownloadError> {
        let path = rfd::AsyncFileDialog::new()
            .set_file_name(suggested_name)
            .add_filter("Video File", &["mp4"])
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
            .ok_or_else(|| {
                DownloadError::PermissionDenied("The save dialog was dismissed".to_string())
            })?;

        let file = FsWritableFile::create(&path).await.map_err(|e| {
            DownloadError::PermissionDenied(format!("Cannot write {}: {}", path.display(), e))
        })?;

        Ok(Box::new(file))
    }
}

pub struct FsWritableFile {
    path: PathBuf,
    file: Option<tokio::fs::File>,
}

impl FsWritableFile {
    pub async fn create(path: &Path) -> io::Result<Self> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    fn file(&mut self) -> io::Result<&mut tokio::fs::File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("file already closed"))
    }
}

#[async_trait]
impl WritableFile for FsWritableFile {
    async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.file()?.write_all(data).await
    }

    async fn close(&mut self) -> io::Result<()> {
        self.file()?.sync_all().await?;
        self.file = None;
        debug!(path = %self.path.display(), "picker file closed");
        Ok(())
    }

    async fn abort(&mut self) {
        self.file = None;
        let _ = tokio::fs::remove_file(&self.path).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("picked.mp4");

        let mut file = FsWritableFile::create(&path).await.unwrap();
        file.write(b"abc").await.unwrap();
        file.write(b"def").await.unwrap();
        file.close().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"abcdef");
        assert!(file.write(b"late").await.is_err());
    }

    #[tokio::test]
    async fn test_abort_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.mp4");

        let mut file = FsWritableFile::create(&path).await.unwrap();
        file.write(b"half").await.unwrap();
        file.abort().await;

        assert!(!path.exists());
    }
}
