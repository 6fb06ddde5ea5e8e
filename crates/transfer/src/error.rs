//! Transfer error types.

use std::fmt;

use crate::types::TransferState;

/// Errors produced by a transfer. Every variant is fatal to the transfer
/// it came from; nothing is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checksum mismatch: expected {expected}, destination reported {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("upload rejected: {0}")]
    UploadRejected(String),

    #[error("part {part_number} upload failed: {cause}")]
    PartUploadFailed { part_number: u32, cause: PartFailure },

    #[error("finalize failed: {0}")]
    FinalizeFailed(String),

    #[error("cancelled")]
    Cancelled,

    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    #[error("transfer engine already used (state: {0})")]
    EngineSpent(TransferState),
}

/// Why a single part PUT was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartFailure {
    /// The storage backend answered with a non-2xx status.
    Status(u16),
    /// 2xx response without an `ETag` header.
    MissingReceipt,
    /// The request never produced a response.
    Transport(String),
}

impl fmt::Display for PartFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartFailure::Status(status) => write!(f, "status {status}"),
            PartFailure::MissingReceipt => f.write_str("missing receipt"),
            PartFailure::Transport(reason) => f.write_str(reason),
        }
    }
}

/// Errors from the HTTP collaborators (Files API and part storage).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid access token")]
    InvalidToken,

    #[error("invalid header: {0}")]
    InvalidHeader(String),
}
