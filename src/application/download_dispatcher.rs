use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::{
    api::ApiClient,
    domain::{DownloadError, RuntimeEnvironment},
    platform::{BridgeCallbacks, DownloadLink, LinkTarget, Platform},
};

/// One way of getting a video onto disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStrategy {
    /// Hand the URL to the host's download manager.
    NativeBridge,
    /// Fetch, then write into a file the user picked.
    FilePicker,
    /// Fetch, then activate an in-page download link.
    AnchorDownload,
    /// Fetch, then activate a link opened by the system.
    SystemLink,
}

#[async_trait]
pub trait ByteFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, DownloadError>;
}

#[async_trait]
impl ByteFetcher for ApiClient {
    async fn fetch(&self, url: &str) -> Result<Bytes, DownloadError> {
        self.fetch_bytes(url)
            .await
            .map_err(|e| DownloadError::FetchFailed(e.user_message()))
    }
}

#[async_trait]
pub trait VideoSaver: Send + Sync {
    async fn save(
        &self,
        video_url: &str,
        filename: &str,
        env: RuntimeEnvironment,
    ) -> Result<SaveStrategy, DownloadError>;
}

/// Picks a save strategy for the runtime environment and runs it, falling
/// back through the list until one succeeds.
#[derive(Clone)]
pub struct DownloadDispatcher {
    fetcher: Arc<dyn ByteFetcher>,
    platform: Platform,
}

impl DownloadDispatcher {
    pub fn new(fetcher: Arc<dyn ByteFetcher>, platform: Platform) -> Self {
        Self { fetcher, platform }
    }

    /// Strategies to try, in order, for `env`.
    pub fn plan(&self, env: RuntimeEnvironment) -> Vec<SaveStrategy> {
        let platform = &self.platform;
        let mut plan = Vec::new();

        match env {
            RuntimeEnvironment::StandardBrowser => {
                if platform.links.is_some() {
                    plan.push(SaveStrategy::AnchorDownload);
                }
            }
            RuntimeEnvironment::EmbeddedWebView => {
                if platform.bridge.is_some() {
                    plan.push(SaveStrategy::NativeBridge);
                }
                if platform.picker.is_some() {
                    plan.push(SaveStrategy::FilePicker);
                }
                if platform.links.is_some() {
                    plan.push(SaveStrategy::SystemLink);
                }
            }
        }

        plan
    }

    async fn run(
        &self,
        strategy: SaveStrategy,
        video_url: &str,
        filename: &str,
        fetched: &mut Option<Bytes>,
    ) -> Result<(), DownloadError> {
        match strategy {
            SaveStrategy::NativeBridge => self.save_via_bridge(video_url, filename).await,
            SaveStrategy::FilePicker => self.save_via_picker(video_url, filename, fetched).await,
            SaveStrategy::AnchorDownload => {
                self.save_via_link(video_url, filename, LinkTarget::SameFrame, fetched)
                    .await
            }
            SaveStrategy::SystemLink => {
                self.save_via_link(video_url, filename, LinkTarget::System, fetched)
                    .await
            }
        }
    }

    /// Fetch at most once per save; picker and link strategies share the bytes.
    async fn bytes_for(
        &self,
        video_url: &str,
        fetched: &mut Option<Bytes>,
    ) -> Result<Bytes, DownloadError> {
        if let Some(bytes) = fetched {
            return Ok(bytes.clone());
        }

        let bytes = self.fetcher.fetch(video_url).await?;
        debug!(len = bytes.len(), "fetched video");
        *fetched = Some(bytes.clone());
        Ok(bytes)
    }

    async fn save_via_bridge(&self, video_url: &str, filename: &str) -> Result<(), DownloadError> {
        let bridge = self.platform.bridge.as_ref().ok_or_else(|| {
            DownloadError::UnsupportedEnvironment("no native download bridge".to_string())
        })?;

        let (callbacks, completion) = BridgeCallbacks::channel();
        bridge
            .download_file(video_url, filename, callbacks)
            .map_err(|e| DownloadError::PermissionDenied(e.to_string()))?;

        match completion.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(DownloadError::PermissionDenied(message)),
            Err(_) => Err(DownloadError::PermissionDenied(
                "The download bridge dropped the request".to_string(),
            )),
        }
    }

    async fn save_via_picker(
        &self,
        video_url: &str,
        filename: &str,
        fetched: &mut Option<Bytes>,
    ) -> Result<(), DownloadError> {
        let picker = self.platform.picker.as_ref().ok_or_else(|| {
            DownloadError::UnsupportedEnvironment("no save file picker".to_string())
        })?;

        let bytes = self.bytes_for(video_url, fetched).await?;
        let mut file = picker.show_save_file_picker(filename).await?;

        if let Err(e) = file.write(&bytes).await {
            file.abort().await;
            return Err(DownloadError::PermissionDenied(format!(
                "Failed to write file: {}",
                e
            )));
        }

        if let Err(e) = file.close().await {
            file.abort().await;
            return Err(DownloadError::PermissionDenied(format!(
                "Failed to finish file: {}",
                e
            )));
        }

        Ok(())
    }

    async fn save_via_link(
        &self,
        video_url: &str,
        filename: &str,
        target: LinkTarget,
        fetched: &mut Option<Bytes>,
    ) -> Result<(), DownloadError> {
        let links = self.platform.links.as_ref().ok_or_else(|| {
            DownloadError::UnsupportedEnvironment("no way to activate download links".to_string())
        })?;

        let bytes = self.bytes_for(video_url, fetched).await?;
        let href = self.platform.objects.create(bytes);
        let link = DownloadLink {
            href: href.clone(),
            download: filename.to_string(),
            target,
        };

        let result = links.activate(&link);
        self.platform.objects.revoke(&href);
        result
    }
}

#[async_trait]
impl VideoSaver for DownloadDispatcher {
    async fn save(
        &self,
        video_url: &str,
        filename: &str,
        env: RuntimeEnvironment,
    ) -> Result<SaveStrategy, DownloadError> {
        let plan = self.plan(env);
        if plan.is_empty() {
            return Err(DownloadError::UnsupportedEnvironment(format!(
                "nothing can save files in {:?}",
                env
            )));
        }

        let mut fetched = None;
        let mut last_error = None;

        for strategy in plan {
            debug!(?strategy, %filename, "trying save strategy");
            match self.run(strategy, video_url, filename, &mut fetched).await {
                Ok(()) => {
                    info!(?strategy, %filename, "video handed off for saving");
                    return Ok(strategy);
                }
                // Every remaining strategy would need the same bytes.
                Err(e @ DownloadError::FetchFailed(_)) => return Err(e),
                Err(e) => {
                    warn!(?strategy, error = %e, "save strategy failed, trying the next one");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DownloadError::UnsupportedEnvironment("no save strategy succeeded".to_string())
        }))
    }
}
