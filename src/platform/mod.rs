//! Host capabilities a save can go through: object URLs, download links,
//! a native download bridge and a save-file picker.

pub mod bridge;
pub mod links;
pub mod object_url;
pub mod picker;

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

pub use bridge::{BridgeCallbacks, BridgeCompletion, DownloadManagerBridge, NativeBridge};
pub use links::{DownloadLink, DownloadsFolderActivator, LinkActivator, LinkTarget};
pub use object_url::ObjectUrlRegistry;
pub use picker::{FsWritableFile, RfdSavePicker, SaveFilePicker, WritableFile};

use crate::api::ApiClient;
use crate::config::AppConfig;

/// The capabilities exposed by the environment we run in. Missing ones are `None`.
#[derive(Clone, Default)]
pub struct Platform {
    pub objects: ObjectUrlRegistry,
    pub bridge: Option<Arc<dyn NativeBridge>>,
    pub picker: Option<Arc<dyn SaveFilePicker>>,
    pub links: Option<Arc<dyn LinkActivator>>,
}

impl Platform {
    /// Wire up the desktop implementations according to `config`.
    pub fn desktop(config: &AppConfig, client: ApiClient) -> Self {
        let objects = ObjectUrlRegistry::default();
        let download_dir = config.resolved_download_dir();
        debug!(dir = ?download_dir, "resolved downloads folder");

        let links = download_dir.clone().map(|dir| {
            Arc::new(DownloadsFolderActivator::new(dir, objects.clone())) as Arc<dyn LinkActivator>
        });
        let bridge = download_dir.filter(|_| config.native_bridge).map(|dir| {
            Arc::new(DownloadManagerBridge::new(client, dir)) as Arc<dyn NativeBridge>
        });
        let picker = config
            .file_picker
            .then(|| Arc::new(RfdSavePicker) as Arc<dyn SaveFilePicker>);

        Self {
            objects,
            bridge,
            picker,
            links,
        }
    }

    pub fn with_bridge(mut self, bridge: Arc<dyn NativeBridge>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn with_picker(mut self, picker: Arc<dyn SaveFilePicker>) -> Self {
        self.picker = Some(picker);
        self
    }

    pub fn with_links(mut self, links: Arc<dyn LinkActivator>) -> Self {
        self.links = Some(links);
        self
    }
}

/// Claim `dir/name`, or `dir/name (n).ext` when that is taken, by creating an
/// empty file there. Concurrent saves of the same name never share a path.
pub(crate) fn reserve_destination(dir: &Path, filename: &str) -> io::Result<PathBuf> {
    let name = Path::new(filename);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    let extension = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let candidates = std::iter::once(dir.join(filename))
        .chain((1..).map(|n| dir.join(format!("{} ({}){}", stem, n, extension))));

    for candidate in candidates {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for {}", filename),
    ))
}

/// Remove a reserved destination and its `.part` file after a failed save.
pub(crate) async fn release_destination(destination: &Path) {
    let _ = tokio::fs::remove_file(part_path(destination)).await;
    let _ = tokio::fs::remove_file(destination).await;
}

pub(crate) fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use bytes::Bytes;

    use super::*;
    use crate::domain::DownloadError;

    /// Link activator that remembers what each activation offered.
    pub struct RecordingActivator {
        objects: ObjectUrlRegistry,
        pub activations: Mutex<Vec<(DownloadLink, Bytes)>>,
    }

    impl RecordingActivator {
        pub fn new(objects: ObjectUrlRegistry) -> Self {
            Self {
                objects,
                activations: Mutex::new(Vec::new()),
            }
        }

        pub fn recorded(&self) -> Vec<(DownloadLink, Bytes)> {
            self.activations.lock().unwrap().clone()
        }
    }

    impl LinkActivator for RecordingActivator {
        fn activate(&self, link: &DownloadLink) -> Result<(), DownloadError> {
            let bytes = self
                .objects
                .resolve(&link.href)
                .ok_or_else(|| DownloadError::FetchFailed("revoked".to_string()))?;
            self.activations.lock().unwrap().push((link.clone(), bytes));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_destination() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"old").unwrap();

        let first = reserve_destination(dir.path(), "a.mp4").unwrap();
        let second = reserve_destination(dir.path(), "a.mp4").unwrap();

        assert_eq!(first, dir.path().join("a (1).mp4"));
        assert_eq!(second, dir.path().join("a (2).mp4"));
        assert!(second.exists());
        assert_eq!(std::fs::read(dir.path().join("a.mp4")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_release_destination() {
        let dir = tempfile::tempdir().unwrap();
        let destination = reserve_destination(dir.path(), "a.mp4").unwrap();
        std::fs::write(part_path(&destination), b"partial").unwrap();

        release_destination(&destination).await;
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/tmp/x.mp4")),
            PathBuf::from("/tmp/x.mp4.part")
        );
    }

    #[test]
    fn test_desktop_platform_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            download_dir: Some(dir.path().to_path_buf()),
            native_bridge: true,
            file_picker: false,
            ..AppConfig::default()
        };

        let platform = Platform::desktop(&config, ApiClient::new(config.api.clone()));
        assert!(platform.links.is_some());
        assert!(platform.bridge.is_some());
        assert!(platform.picker.is_none());
    }
}
