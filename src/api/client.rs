use futures::Stream;
use futures::TryStreamExt;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

use super::models::{ApiConfig, ApiResponse, ErrorBody, VideoInfoResponse};
use crate::domain::VideoInfo;
use crate::utils::suggested_filename;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("{message}")]
    Http { status: StatusCode, message: String },

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Video URL not found")]
    NoVideoUrl,
}

impl ApiError {
    /// Human readable text for the status line
    pub fn user_message(&self) -> String {
        match self {
            Self::RequestError(_) => "Could not reach the server".to_string(),
            Self::Http { message, .. } | Self::ApiError(message) => message.clone(),
            Self::InvalidResponse(_) => "The server returned an unexpected response".to_string(),
            Self::NoVideoUrl => "No video was found in this post".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Turn a failed HTTP response into something a user can read.
///
/// A `message` (or `error`) field in the body wins, otherwise the status code decides.
pub fn describe_http_error(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            if !message.trim().is_empty() {
                return message;
            }
        }
    }

    match status {
        StatusCode::BAD_REQUEST => "Invalid request".to_string(),
        StatusCode::NOT_FOUND => "This post could not be found".to_string(),
        StatusCode::TOO_MANY_REQUESTS => "Too many requests, please try again later".to_string(),
        s if s.is_server_error() => {
            "Something went wrong on the server, please try again later".to_string()
        }
        s => format!("Request failed with status {}", s.as_u16()),
    }
}

#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Ask the resolver for the direct video URL behind a post link
    pub async fn get_video_info(&self, post_url: &str) -> Result<VideoInfo> {
        let endpoint = self.config.video_endpoint();
        debug!(%endpoint, %post_url, "resolving video");

        let response = self
            .http
            .get(&endpoint)
            .query(&[("postUrl", post_url)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = describe_http_error(status, &body);
            warn!(%status, %message, "resolver rejected request");
            return Err(ApiError::Http { status, message });
        }

        let body: ApiResponse<VideoInfoResponse> = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))?;

        let data = match body {
            ApiResponse::Success { data } => data,
            ApiResponse::Error { message } => return Err(ApiError::ApiError(message)),
        };

        if data.video_url.is_empty() {
            return Err(ApiError::NoVideoUrl);
        }

        Ok(VideoInfo {
            filename: suggested_filename(&data.filename, post_url),
            video_url: data.video_url,
        })
    }

    /// Fetch the whole body at `url` into memory
    pub async fn fetch_bytes(&self, url: &str) -> Result<bytes::Bytes> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status,
                message: format!("Download request failed with status {}", status.as_u16()),
            });
        }

        Ok(response.bytes().await?)
    }

    /// Download file with progress stream
    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        download_url: &str,
    ) -> Result<(Option<u64>, impl Stream<Item = Result<bytes::Bytes>>)> {
        let response = self.http.get(download_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status,
                message: format!("Download request failed with status {}", status.as_u16()),
            });
        }

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(ApiError::RequestError);

        Ok((total_size, stream))
    }
}
