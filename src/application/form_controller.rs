use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use tracing::{info, warn};

use super::download_dispatcher::VideoSaver;
use crate::{
    api::ApiClient,
    domain::{AppError, DownloadStatus, RuntimeEnvironment, SubmissionInput, VideoInfo},
};

#[async_trait]
pub trait VideoResolver: Send + Sync {
    async fn resolve(&self, post_url: &str) -> Result<VideoInfo, AppError>;
}

#[async_trait]
impl VideoResolver for ApiClient {
    async fn resolve(&self, post_url: &str) -> Result<VideoInfo, AppError> {
        self.get_video_info(post_url)
            .await
            .map_err(|e| AppError::Resolver(e.user_message()))
    }
}

/// Runs one submission at a time: validate, resolve, save.
#[derive(Clone)]
pub struct FormController {
    resolver: Arc<dyn VideoResolver>,
    saver: Arc<dyn VideoSaver>,
    env: RuntimeEnvironment,
    in_flight: Arc<AtomicBool>,
}

impl FormController {
    pub fn new(
        resolver: Arc<dyn VideoResolver>,
        saver: Arc<dyn VideoSaver>,
        env: RuntimeEnvironment,
    ) -> Self {
        Self {
            resolver,
            saver,
            env,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn environment(&self) -> RuntimeEnvironment {
        self.env
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start a submission.
    ///
    /// Invalid input and a submission already in flight are rejected right
    /// away, before any request is made. Otherwise the returned stream yields
    /// every status the submission goes through, ending in `Complete` or
    /// `Failed`.
    pub fn submit(
        &self,
        input: &SubmissionInput,
    ) -> Result<BoxStream<'static, DownloadStatus>, AppError> {
        input.validate()?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("submission rejected, another one is still running");
            return Err(AppError::Busy);
        }

        let post_url = input.post_url.trim().to_string();
        info!(%post_url, "submission accepted");

        let ctx = SubmitContext {
            resolver: self.resolver.clone(),
            saver: self.saver.clone(),
            env: self.env,
            _guard: InFlightGuard(self.in_flight.clone()),
        };

        Ok(futures::stream::unfold(
            SubmitState::Start { ctx, post_url },
            |state| async move {
                match state {
                    SubmitState::Start { ctx, post_url } => Some((
                        DownloadStatus::Starting,
                        SubmitState::Resolving { ctx, post_url },
                    )),
                    SubmitState::Resolving { ctx, post_url } => {
                        let resolved = ctx.resolver.resolve(&post_url).await;
                        match resolved {
                            Ok(video) => Some((
                                DownloadStatus::Saving,
                                SubmitState::Saving { ctx, video },
                            )),
                            Err(e) => {
                                warn!(error = %e, "resolving the post failed");
                                Some((DownloadStatus::Failed(e.to_string()), SubmitState::Finished))
                            }
                        }
                    }
                    SubmitState::Saving { ctx, video } => {
                        let saved = ctx
                            .saver
                            .save(&video.video_url, &video.filename, ctx.env)
                            .await;
                        match saved {
                            Ok(strategy) => {
                                info!(?strategy, filename = %video.filename, "submission complete");
                                Some((DownloadStatus::Complete, SubmitState::Finished))
                            }
                            Err(e) => {
                                warn!(error = %e, "saving the video failed");
                                Some((
                                    DownloadStatus::Failed(AppError::from(e).to_string()),
                                    SubmitState::Finished,
                                ))
                            }
                        }
                    }
                    SubmitState::Finished => None,
                }
            },
        )
        .boxed())
    }
}

struct SubmitContext {
    resolver: Arc<dyn VideoResolver>,
    saver: Arc<dyn VideoSaver>,
    env: RuntimeEnvironment,
    _guard: InFlightGuard,
}

enum SubmitState {
    Start { ctx: SubmitContext, post_url: String },
    Resolving { ctx: SubmitContext, post_url: String },
    Saving { ctx: SubmitContext, video: VideoInfo },
    Finished,
}

/// Clears the in-flight flag when the submission ends or its stream is dropped.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
