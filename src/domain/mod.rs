pub mod error;
pub mod model;

pub use error::{AppError, DownloadError};
pub use model::{DownloadStatus, RuntimeEnvironment, SubmissionInput, VideoInfo};
