use serde::{Deserialize, Serialize};

/// Envelope returned by the resolver for every request
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResponse<T> {
    Success { data: T },
    Error { message: String },
}

/// Payload of a successful `/api/video` call
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoInfoResponse {
    #[serde(default)]
    pub filename: String,
    #[serde(rename = "videoUrl")]
    pub video_url: String,
}

/// Loose shape of an error body; some deployments omit `status`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Configuration for the API client
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://instagram-videos.vercel.app".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn video_endpoint(&self) -> String {
        format!("{}/api/video", self.base_url.trim_end_matches('/'))
    }
}
