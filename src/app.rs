use std::sync::Arc;

use futures::StreamExt;
use iced::Task;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::application::{DownloadDispatcher, FormController};
use crate::config::AppConfig;
use crate::domain::{AppError, DownloadStatus, SubmissionInput};
use crate::platform::Platform;
use crate::ui::{DownloadMessage, DownloadView};

pub struct DownloadApp {
    view: DownloadView,
    controller: FormController,
}

impl DownloadApp {
    pub fn new(config: &AppConfig) -> Self {
        let env = config.runtime_environment();
        debug!(?env, user_agent = %config.user_agent(), "detected runtime environment");

        let api_client = ApiClient::new(config.api.clone());
        let platform = Platform::desktop(config, api_client.clone());
        let dispatcher = DownloadDispatcher::new(Arc::new(api_client.clone()), platform);
        let controller = FormController::new(Arc::new(api_client), Arc::new(dispatcher), env);

        Self::with_controller(controller)
    }

    pub fn with_controller(controller: FormController) -> Self {
        Self {
            view: DownloadView::new(controller.environment()),
            controller,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    StatusChanged(DownloadStatus),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            if let DownloadMessage::DownloadPressed = ui_msg {
                let input = SubmissionInput::new(app.view.post_url.clone());
                match app.controller.submit(&input) {
                    Ok(statuses) => {
                        app.view.validation_error = None;
                        return Task::stream(statuses.map(Message::StatusChanged));
                    }
                    Err(AppError::Validation) => {
                        app.view.status = DownloadStatus::Idle;
                        app.view.validation_error = Some(AppError::Validation.to_string());
                    }
                    Err(e) => {
                        warn!(error = %e, "submission ignored");
                    }
                }
            }
        }
        Message::StatusChanged(status) => {
            if status.is_terminal() {
                info!(?status, "submission finished");
            } else {
                debug!(?status, "status changed");
            }
            app.view.status = status;
        }
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}
