use iced::{
    widget::{button, column, text, text_input, Space},
    Color, Element, Length,
};

use crate::domain::{DownloadStatus, RuntimeEnvironment};

const ERROR_COLOR: Color = Color::from_rgb(0.86, 0.15, 0.15);
const STATUS_COLOR: Color = Color::from_rgb(0.15, 0.39, 0.92);

/// Main view state
pub struct DownloadView {
    pub post_url: String,
    pub status: DownloadStatus,
    pub validation_error: Option<String>,
    pub env: RuntimeEnvironment,
}

impl DownloadView {
    pub fn new(env: RuntimeEnvironment) -> Self {
        Self {
            post_url: String::new(),
            status: DownloadStatus::Idle,
            validation_error: None,
            env,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    PostUrlChanged(String),
    DownloadPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::PostUrlChanged(url) => {
                self.post_url = url;
                self.validation_error = None;
            }
            DownloadMessage::DownloadPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let pending = self.is_pending();

        column![
            text("Reel Saver").size(32),
            Space::new().height(Length::Fixed(20.0)),
            text(self.validation_error.as_deref().unwrap_or_default())
                .size(14)
                .color(ERROR_COLOR),
            text_input("Paste your Instagram link here...", &self.post_url)
                .on_input_maybe((!pending).then_some(DownloadMessage::PostUrlChanged))
                .on_submit_maybe((!pending).then_some(DownloadMessage::DownloadPressed))
                .padding(10),
            button(if pending { "Downloading..." } else { "Download" })
                .on_press_maybe((!pending).then_some(DownloadMessage::DownloadPressed))
                .padding([10, 20]),
            Space::new().height(Length::Fixed(10.0)),
            text(status_line(&self.status, self.env))
                .size(14)
                .color(STATUS_COLOR),
            text(hint(self.env)).size(12),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}

/// What the status line says for `status`.
pub fn status_line(status: &DownloadStatus, env: RuntimeEnvironment) -> String {
    let webview = env == RuntimeEnvironment::EmbeddedWebView;
    match status {
        DownloadStatus::Idle => String::new(),
        DownloadStatus::Starting => "Starting download...".to_string(),
        DownloadStatus::Saving if webview => "Saving to Downloads folder...".to_string(),
        DownloadStatus::Saving => "Saving video...".to_string(),
        DownloadStatus::Complete if webview => "Video saved to Downloads folder!".to_string(),
        DownloadStatus::Complete => "Download complete!".to_string(),
        DownloadStatus::Failed(reason) => format!("Download failed. {}", reason),
    }
}

pub fn hint(env: RuntimeEnvironment) -> &'static str {
    match env {
        RuntimeEnvironment::EmbeddedWebView => {
            "Videos will be saved directly to your Downloads folder"
        }
        RuntimeEnvironment::StandardBrowser => "Click the download button to save the video",
    }
}
