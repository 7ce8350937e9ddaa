use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{part_path, release_destination, reserve_destination, ObjectUrlRegistry};
use crate::domain::DownloadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    /// Regular in-page download.
    SameFrame,
    /// Opened outside the embedded view, by the system.
    System,
}

/// A transient `<a href download target>` trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub href: String,
    pub download: String,
    pub target: LinkTarget,
}

/// Something that can "click" a download link. Activation only hands the
/// link over; it does not wait for the save to finish.
pub trait LinkActivator: Send + Sync {
    fn activate(&self, link: &DownloadLink) -> Result<(), DownloadError>;
}

/// Saves activated links into a downloads folder on a background task.
pub struct DownloadsFolderActivator {
    dir: PathBuf,
    objects: ObjectUrlRegistry,
}

impl DownloadsFolderActivator {
    pub fn new(dir: PathBuf, objects: ObjectUrlRegistry) -> Self {
        Self { dir, objects }
    }

    /// Like [`LinkActivator::activate`] but returns the write task.
    pub fn activate_with_handle(
        &self,
        link: &DownloadLink,
    ) -> Result<JoinHandle<io::Result<PathBuf>>, DownloadError> {
        // The bytes are captured now; the object URL may be revoked right after.
        let bytes = self.objects.resolve(&link.href).ok_or_else(|| {
            DownloadError::FetchFailed(format!("{} is no longer available", link.href))
        })?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            DownloadError::UnsupportedEnvironment("no async runtime to save files on".to_string())
        })?;

        std::fs::create_dir_all(&self.dir).map_err(|e| {
            DownloadError::PermissionDenied(format!("Cannot use {}: {}", self.dir.display(), e))
        })?;

        let destination = reserve_destination(&self.dir, &link.download).map_err(|e| {
            DownloadError::PermissionDenied(format!("Cannot save {}: {}", link.download, e))
        })?;
        if link.target == LinkTarget::System {
            info!(path = %destination.display(), "handing download off to the system");
        } else {
            debug!(path = %destination.display(), "starting in-page download");
        }

        Ok(runtime.spawn(async move {
            let result = write_atomically(&destination, bytes).await;
            match &result {
                Ok(path) => info!(path = %path.display(), "download saved"),
                Err(e) => warn!(path = %destination.display(), error = %e, "download failed"),
            }
            result
        }))
    }
}

impl LinkActivator for DownloadsFolderActivator {
    fn activate(&self, link: &DownloadLink) -> Result<(), DownloadError> {
        self.activate_with_handle(link).map(drop)
    }
}

async fn write_atomically(destination: &Path, bytes: Bytes) -> io::Result<PathBuf> {
    let part = part_path(destination);
    let written = match tokio::fs::write(&part, &bytes).await {
        Ok(()) => tokio::fs::rename(&part, destination).await,
        Err(e) => Err(e),
    };

    if let Err(e) = written {
        release_destination(destination).await;
        return Err(e);
    }
    Ok(destination.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(href: String, name: &str) -> DownloadLink {
        DownloadLink {
            href,
            download: name.to_string(),
            target: LinkTarget::SameFrame,
        }
    }

    #[tokio::test]
    async fn test_activation_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let objects = ObjectUrlRegistry::default();
        let activator = DownloadsFolderActivator::new(dir.path().to_path_buf(), objects.clone());

        let href = objects.create(Bytes::from_static(b"mp4 bytes"));
        let handle = activator
            .activate_with_handle(&link(href.clone(), "ABC123.mp4"))
            .unwrap();
        // Revoking straight after activation must not affect the save.
        objects.revoke(&href);

        let saved = handle.await.unwrap().unwrap();
        assert_eq!(saved, dir.path().join("ABC123.mp4"));
        assert_eq!(std::fs::read(&saved).unwrap(), b"mp4 bytes");
        assert!(!part_path(&saved).exists());
    }

    #[tokio::test]
    async fn test_activation_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"old").unwrap();
        let objects = ObjectUrlRegistry::default();
        let activator = DownloadsFolderActivator::new(dir.path().to_path_buf(), objects.clone());

        let href = objects.create(Bytes::from_static(b"new"));
        let saved = activator
            .activate_with_handle(&link(href, "clip.mp4"))
            .unwrap()
            .await
            .unwrap()
            .unwrap();

        assert_eq!(saved, dir.path().join("clip (1).mp4"));
        assert_eq!(std::fs::read(dir.path().join("clip.mp4")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_back_to_back_activations_keep_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let objects = ObjectUrlRegistry::default();
        let activator = DownloadsFolderActivator::new(dir.path().to_path_buf(), objects.clone());

        let large = Bytes::from(vec![b'A'; 4 * 1024 * 1024]);
        let small = Bytes::from(vec![b'B'; 16]);
        let first_href = objects.create(large.clone());
        let second_href = objects.create(small.clone());

        let first = activator
            .activate_with_handle(&link(first_href, "ABC123.mp4"))
            .unwrap();
        let second = activator
            .activate_with_handle(&link(second_href, "ABC123.mp4"))
            .unwrap();

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert_eq!(first, dir.path().join("ABC123.mp4"));
        assert_eq!(second, dir.path().join("ABC123 (1).mp4"));
        assert_eq!(std::fs::read(&first).unwrap(), &large[..]);
        assert_eq!(std::fs::read(&second).unwrap(), &small[..]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_releases_destination() {
        let dir = tempfile::tempdir().unwrap();
        let destination = reserve_destination(dir.path(), "clip.mp4").unwrap();
        // A directory in the way of the part file makes the write fail.
        std::fs::create_dir(part_path(&destination)).unwrap();

        let err = write_atomically(&destination, Bytes::from_static(b"data")).await;
        assert!(err.is_err());
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_revoked_href_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let objects = ObjectUrlRegistry::default();
        let activator = DownloadsFolderActivator::new(dir.path().to_path_buf(), objects.clone());

        let href = objects.create(Bytes::from_static(b"gone"));
        objects.revoke(&href);

        let err = activator.activate(&link(href, "gone.mp4")).unwrap_err();
        assert!(matches!(err, DownloadError::FetchFailed(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
