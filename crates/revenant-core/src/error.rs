use thiserror::Error;

/// Error taxonomy for every public operation in this crate.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("volume {0} is unavailable (is the process running elevated?)")]
    VolumeUnavailable(String),

    #[error("device control 0x{code:08x} failed: {os_error}")]
    IoctlFailed { code: u32, os_error: String },

    #[error("buffer does not contain a valid MFT file record")]
    NotAFileRecord,

    #[error("file record has no recoverable $DATA attribute")]
    NoDataAttribute,

    #[error("volume ended before the expected run data was read")]
    UnexpectedVolumeEnd,

    #[error("recycle-bin data file is missing")]
    SourceMissing,

    #[error("failed writing recovered output: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(windows)]
    #[error("windows API error: {0}")]
    Windows(#[from] windows::core::Error),
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(e: tokio::task::JoinError) -> Self {
        EngineError::Internal(format!("background task failed: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
