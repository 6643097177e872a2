//! Structured error kinds shared by every layer, so a future HTTP
//! boundary only has to translate [`CoreError::status_code`] rather than
//! re-derive the InvalidArgument/NotFound/Internal split itself.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("id {id} not found")]
    NotFound { id: i32 },

    #[error("embedder failure: {message}")]
    EmbedderFailure { message: String },

    #[error("corrupt record: {message}")]
    CorruptRecord { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CoreError::InvalidArgument { message: message.into() }
    }

    pub fn embedder_failure(message: impl Into<String>) -> Self {
        CoreError::EmbedderFailure { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CoreError::Internal { message: message.into() }
    }

    /// The HTTP status a boundary layer should map this error kind to.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::InvalidArgument { .. } => 400,
            CoreError::NotFound { .. } => 404,
            CoreError::EmbedderFailure { .. } | CoreError::CorruptRecord { .. } | CoreError::Internal { .. } => 500,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
