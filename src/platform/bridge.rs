use std::io;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::{part_path, release_destination, reserve_destination};
use crate::api::ApiClient;

/// Receives the outcome reported through [`BridgeCallbacks`].
pub type BridgeCompletion = oneshot::Receiver<Result<(), String>>;

/// Completion handlers for one bridge request.
///
/// Each request gets its own pair, so concurrent downloads can never
/// overwrite each other's handlers.
pub struct BridgeCallbacks {
    tx: oneshot::Sender<Result<(), String>>,
}

impl BridgeCallbacks {
    pub fn channel() -> (Self, BridgeCompletion) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn complete(self) {
        let _ = self.tx.send(Ok(()));
    }

    pub fn error(self, message: impl Into<String>) {
        let _ = self.tx.send(Err(message.into()));
    }
}

/// Host-provided download capability. Fire-and-forget: the call only queues
/// the download, the outcome arrives through `callbacks`.
pub trait NativeBridge: Send + Sync {
    fn download_file(&self, url: &str, filename: &str, callbacks: BridgeCallbacks)
        -> io::Result<()>;
}

/// Bridge backed by our own download manager: streams the file into the
/// downloads folder and reports once it is on disk.
pub struct DownloadManagerBridge {
    client: ApiClient,
    dir: PathBuf,
}

impl DownloadManagerBridge {
    pub fn new(client: ApiClient, dir: PathBuf) -> Self {
        Self { client, dir }
    }
}

impl NativeBridge for DownloadManagerBridge {
    fn download_file(
        &self,
        url: &str,
        filename: &str,
        callbacks: BridgeCallbacks,
    ) -> io::Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| io::Error::new(io::ErrorKind::Unsupported, e))?;
        std::fs::create_dir_all(&self.dir)?;

        let destination = reserve_destination(&self.dir, filename)?;
        let client = self.client.clone();
        let url = url.to_string();
        info!(%url, path = %destination.display(), "download queued");

        runtime.spawn(async move {
            match stream_to_file(&client, &url, &destination).await {
                Ok(()) => {
                    info!(path = %destination.display(), "download finished");
                    callbacks.complete();
                }
                Err(message) => {
                    warn!(%url, %message, "download failed");
                    callbacks.error(message);
                }
            }
        });

        Ok(())
    }
}

async fn stream_to_file(client: &ApiClient, url: &str, destination: &Path) -> Result<(), String> {
    let part = part_path(destination);
    let result = match write_stream(client, url, &part).await {
        Ok(()) => tokio::fs::rename(&part, destination)
            .await
            .map_err(|e| format!("Failed to move file into place: {}", e)),
        Err(message) => Err(message),
    };

    if result.is_err() {
        release_destination(destination).await;
    }
    result
}

async fn write_stream(client: &ApiClient, url: &str, part: &Path) -> Result<(), String> {
    let (total, stream) = client
        .download_file_stream(url)
        .await
        .map_err(|e| e.user_message())?;
    let mut stream = Box::pin(stream);

    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|e| format!("Failed to create file: {}", e))?;

    let mut downloaded: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| e.user_message())?;
        file.write_all(&chunk)
            .await
            .map_err(|e| format!("Write error: {}", e))?;
        downloaded += chunk.len() as u64;
        debug!(downloaded, ?total, "download progress");
    }

    file.sync_all()
        .await
        .map_err(|e| format!("Failed to sync file: {}", e))
}
