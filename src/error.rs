//! Error types for tubefetch

use thiserror::Error;

/// Coarse error classes, used by the HTTP layer to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Client errors
    InvalidInput,
    NotFound,

    // Collaborator errors
    ExtractionFailed,
    FetchFailed,
    MissingDependency,

    // System errors
    InvalidConfig,
    FileError,
    SpawnError,
}

/// Main error type for tubefetch
#[derive(Error, Debug)]
pub enum TubeFetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid download id: {0}")]
    InvalidJobId(String),

    /// Metadata probe failed; carries the collaborator's reason verbatim
    #[error("{0}")]
    Extraction(String),

    #[error("Download failed: {0}")]
    Fetch(String),

    #[error("File not found")]
    NotFound,

    #[error("Missing dependency: {0}. Please install it.")]
    MissingDependency(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TubeFetchError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidUrl(_) | Self::UnsupportedFormat(_) | Self::InvalidJobId(_) => {
                ErrorCode::InvalidInput
            }
            Self::NotFound => ErrorCode::NotFound,
            Self::Extraction(_) => ErrorCode::ExtractionFailed,
            Self::Fetch(_) => ErrorCode::FetchFailed,
            Self::MissingDependency(_) => ErrorCode::MissingDependency,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Self::File(_) => ErrorCode::FileError,
            Self::Spawn(_) => ErrorCode::SpawnError,
            Self::Json(_) => ErrorCode::InvalidConfig,
        }
    }

    /// Whether the caller, not the server, is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self.code(), ErrorCode::InvalidInput | ErrorCode::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, TubeFetchError>;
