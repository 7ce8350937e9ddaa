use reel_saver::{app, config::AppConfig, logging};

fn main() -> iced::Result {
    logging::init_logging();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "falling back to default configuration");
            AppConfig::default()
        }
    };
    tracing::info!(api = %config.api.base_url, "starting Reel Saver");

    iced::application(move || app::DownloadApp::new(&config), app::update, app::view)
        .title("Reel Saver")
        .window_size((520.0, 380.0))
        .run()
}
