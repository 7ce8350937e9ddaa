pub mod download_dispatcher;
pub mod form_controller;

pub use download_dispatcher::{ByteFetcher, DownloadDispatcher, SaveStrategy, VideoSaver};
pub use form_controller::{FormController, VideoResolver};
