//! Engine-level error type with stable wire codes shared by the MCP
//! (JSON-RPC) and REST transports.

use crate::storage::StorageError;

/// Stable numeric codes returned to callers over both transports.
///
/// These fall in the JSON-RPC reserved server-error range (-32000 to
/// -32099) but are specific to memoria, distinct from the generic
/// JSON-RPC codes (parse error, method not found, ...) used by the
/// transport layer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    AccessDenied,
    ContextNotFound,
    EncodingUnknown,
    Corrupted,
    StorageFailure,
    Overloaded,
    DeadlineExceeded,
    NotImplemented,
}

impl ErrorCode {
    pub fn as_i32(&self) -> i32 {
        match self {
            ErrorCode::InvalidInput => -32602,
            ErrorCode::NotFound => -32010,
            ErrorCode::AccessDenied => -32011,
            ErrorCode::ContextNotFound => -32012,
            ErrorCode::EncodingUnknown => -32020,
            ErrorCode::Corrupted => -32030,
            ErrorCode::StorageFailure => -32040,
            ErrorCode::Overloaded => -32050,
            ErrorCode::DeadlineExceeded => -32060,
            ErrorCode::NotImplemented => -32601,
        }
    }

    /// HTTP status used by the REST transport for this code.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::InvalidInput => 400,
            ErrorCode::AccessDenied => 403,
            ErrorCode::NotFound | ErrorCode::ContextNotFound => 404,
            ErrorCode::EncodingUnknown => 422,
            ErrorCode::Corrupted => 409,
            ErrorCode::StorageFailure => 500,
            ErrorCode::Overloaded => 503,
            ErrorCode::DeadlineExceeded => 504,
            ErrorCode::NotImplemented => 501,
        }
    }
}

/// Error surfaced by the memory engine. Every variant maps to a stable
/// [`ErrorCode`] so transports don't need to inspect message text.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("memory not found: {0}")]
    NotFound(String),

    #[error("access denied for owner {0}")]
    AccessDenied(String),

    #[error("context not found: {0}")]
    ContextNotFound(String),

    #[error("unknown encoding: {0}")]
    EncodingUnknown(String),

    #[error("corrupted payload for memory {0}")]
    Corrupted(String),

    #[error("storage failure: {0}")]
    StorageFailure(StorageError),

    #[error("engine overloaded")]
    Overloaded,

    #[error("operation exceeded its deadline")]
    DeadlineExceeded,

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::InvalidInput(_) => ErrorCode::InvalidInput,
            EngineError::NotFound(_) => ErrorCode::NotFound,
            EngineError::AccessDenied(_) => ErrorCode::AccessDenied,
            EngineError::ContextNotFound(_) => ErrorCode::ContextNotFound,
            EngineError::EncodingUnknown(_) => ErrorCode::EncodingUnknown,
            EngineError::Corrupted(_) => ErrorCode::Corrupted,
            EngineError::StorageFailure(_) => ErrorCode::StorageFailure,
            EngineError::Overloaded => ErrorCode::Overloaded,
            EngineError::DeadlineExceeded => ErrorCode::DeadlineExceeded,
            EngineError::NotImplemented(_) => ErrorCode::NotImplemented,
        }
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Corrupted(msg) => EngineError::Corrupted(msg),
            other => EngineError::StorageFailure(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
