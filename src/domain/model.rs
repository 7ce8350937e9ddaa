use url::Url;

use super::AppError;

/// What the user typed into the form, for a single submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionInput {
    pub post_url: String,
}

impl SubmissionInput {
    pub fn new(post_url: impl Into<String>) -> Self {
        Self {
            post_url: post_url.into(),
        }
    }

    /// Parses the post link, rejecting anything that is not an absolute URL.
    pub fn validate(&self) -> Result<Url, AppError> {
        let trimmed = self.post_url.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation);
        }

        Url::parse(trimmed).map_err(|_| AppError::Validation)
    }
}

/// Resolver answer: where the video lives and what to call it on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub filename: String,
    pub video_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DownloadStatus {
    #[default]
    Idle,
    Starting,
    Saving,
    Complete,
    Failed(String),
}

impl DownloadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Starting | Self::Saving)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// Embedded Android WebView, possibly with a host download bridge.
    EmbeddedWebView,
    StandardBrowser,
}

impl RuntimeEnvironment {
    pub fn detect(user_agent: &str) -> Self {
        if user_agent.contains("Android") || user_agent.contains("wv") {
            Self::EmbeddedWebView
        } else {
            Self::StandardBrowser
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_post_link() {
        let input = SubmissionInput::new("  https://www.instagram.com/p/ABC123/ ");
        let url = input.validate().unwrap();
        assert_eq!(url.host_str(), Some("www.instagram.com"));
    }

    #[test]
    fn test_validate_rejects_non_urls() {
        for raw in ["not-a-url", "", "   ", "instagram.com/p/ABC", "/p/ABC123"] {
            let input = SubmissionInput::new(raw);
            assert!(
                matches!(input.validate(), Err(AppError::Validation)),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_detect_environment() {
        let webview = "Mozilla/5.0 (Linux; Android 13; Pixel 7 Build/TQ3A; wv) AppleWebKit/537.36";
        let desktop = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/126.0";
        let windows = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Gecko/20100101 Firefox/128.0";

        assert_eq!(
            RuntimeEnvironment::detect(webview),
            RuntimeEnvironment::EmbeddedWebView
        );
        assert_eq!(
            RuntimeEnvironment::detect(desktop),
            RuntimeEnvironment::StandardBrowser
        );
        assert_eq!(
            RuntimeEnvironment::detect(windows),
            RuntimeEnvironment::StandardBrowser
        );
    }

    #[test]
    fn test_status_flags() {
        assert!(!DownloadStatus::Idle.is_pending());
        assert!(DownloadStatus::Saving.is_pending());
        assert!(DownloadStatus::Failed("x".into()).is_terminal());
        assert!(!DownloadStatus::Starting.is_terminal());
    }
}
