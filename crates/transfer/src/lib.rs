//! Chunked, checksum-verified multipart upload of files to Polar storage.
//!
//! A [`TransferEngine`] buffers one file, hashes it, splits it into parts,
//! opens an upload session through a [`SessionApi`], PUTs each part through
//! a [`PartSink`] and finalizes the session with the collected receipts.

mod chunked;
mod engine;
mod error;
mod progress;
mod session;
mod sink;
mod source;
mod types;
mod validation;

#[cfg(test)]
mod test_support;

pub use chunked::{checksum_bytes, part_ranges, plan_parts, prepare, read_to_buffer};
pub use engine::{TransferEngine, transfer};
pub use error::{ApiError, PartFailure, TransferError};
pub use progress::{
    ProgressCallback, ProgressMeter, ProgressSnapshot, UploadedCallback, format_bytes,
};
pub use session::{FilesClient, SessionApi};
pub use sink::{HttpPartSink, PartResponse, PartSink};
pub use source::{FALLBACK_MIME_TYPE, detect_mime_type};
pub use types::{
    ByteSource, CompletedPart, PartPlan, PlannedPart, SessionDescriptor, TransferRequest,
    TransferState,
};
pub use validation::validate_file_name;

/// Default part size: 10 MiB.
///
/// The last part of a file holds the remainder, which may be empty.
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;
