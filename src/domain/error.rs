use thiserror::Error;

/// Why a save attempt did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    #[error("Failed to fetch the video: {0}")]
    FetchFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("No way to save files here: {0}")]
    UnsupportedEnvironment(String),
}

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Provide a valid Instagram post link")]
    Validation,

    #[error("A download is already in progress")]
    Busy,

    #[error("{0}")]
    Resolver(String),

    #[error(transparent)]
    Download(#[from] DownloadError),
}
