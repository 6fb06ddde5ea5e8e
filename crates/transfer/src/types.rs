use std::fmt;
use std::ops::Range;

use polar_migrate_protocol::{
    FileService, FileUpload, S3FileCreatePart, S3FileUploadCompletedPart, S3FileUploadPart,
};
use tokio::io::AsyncRead;

use crate::TransferError;

/// Byte source handed to the engine. Drained exactly once.
pub type ByteSource = Box<dyn AsyncRead + Send + Unpin>;

/// One upload job: file metadata plus the bytes to send.
pub struct TransferRequest {
    pub organization_id: String,
    pub service: FileService,
    pub name: String,
    pub mime_type: String,
    /// Declared size in bytes; the drained source must match it exactly.
    pub size: u64,
    pub source: ByteSource,
}

impl TransferRequest {
    /// Creates a request for a downloadable file.
    pub fn new(
        organization_id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        source: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            service: FileService::Downloadable,
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            source: Box::new(source),
        }
    }
}

impl fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferRequest")
            .field("organization_id", &self.organization_id)
            .field("service", &self.service)
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// A planned part: a contiguous slice of the content and its checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPart {
    /// 1-based, contiguous.
    pub number: u32,
    /// Inclusive.
    pub chunk_start: u64,
    /// Exclusive.
    pub chunk_end: u64,
    /// Base64 SHA-256 of the slice.
    pub checksum: String,
}

impl PlannedPart {
    /// Number of bytes in this part.
    pub fn len(&self) -> u64 {
        self.chunk_end - self.chunk_start
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_end == self.chunk_start
    }

    /// Byte range suitable for slicing the in-memory content.
    pub fn range(&self) -> Range<usize> {
        self.chunk_start as usize..self.chunk_end as usize
    }
}

/// Ordered partition of `[0, total_size)` into parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartPlan {
    parts: Vec<PlannedPart>,
    total_size: u64,
}

impl PartPlan {
    pub(crate) fn new(parts: Vec<PlannedPart>, total_size: u64) -> Self {
        Self { parts, total_size }
    }

    pub fn parts(&self) -> &[PlannedPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Always false: a plan holds at least one part, even for empty content.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Part list announced to the Files API on session creation.
    pub fn to_create_parts(&self) -> Vec<S3FileCreatePart> {
        self.parts
            .iter()
            .map(|p| S3FileCreatePart {
                number: p.number,
                chunk_start: p.chunk_start,
                chunk_end: p.chunk_end,
                checksum_sha256_base64: p.checksum.clone(),
            })
            .collect()
    }
}

/// A negotiated upload session, validated against the plan it was created for.
#[derive(Debug, Clone)]
pub struct SessionDescriptor {
    /// Destination file id (`/v1/files/{file_id}/uploaded`).
    pub file_id: String,
    /// Storage multipart upload id.
    pub upload_id: String,
    pub path: String,
    /// Whole-content checksum sent at creation time.
    pub checksum: String,
    /// Upload targets, index `i` belongs to part number `i + 1`.
    targets: Vec<S3FileUploadPart>,
}

impl SessionDescriptor {
    /// Validates a session creation response against `plan`.
    ///
    /// Every planned part must have exactly one target. A target that echoes
    /// a byte range must echo the planned one.
    pub fn from_upload(
        upload: FileUpload,
        plan: &PartPlan,
        checksum: &str,
    ) -> Result<Self, TransferError> {
        let multipart = upload.upload;
        if multipart.parts.len() != plan.len() {
            return Err(TransferError::UploadRejected(format!(
                "expected {} part targets, got {}",
                plan.len(),
                multipart.parts.len()
            )));
        }

        let mut slots: Vec<Option<S3FileUploadPart>> = vec![None; plan.len()];
        for target in multipart.parts {
            let index = (target.number as usize).checked_sub(1);
            let Some(slot) = index.and_then(|i| slots.get_mut(i)) else {
                return Err(TransferError::UploadRejected(format!(
                    "unexpected part number {}",
                    target.number
                )));
            };
            if slot.is_some() {
                return Err(TransferError::UploadRejected(format!(
                    "duplicate part number {}",
                    target.number
                )));
            }
            *slot = Some(target);
        }

        let mut targets = Vec::with_capacity(plan.len());
        for (planned, slot) in plan.parts().iter().zip(slots) {
            // Length equality above plus no duplicates means every slot is filled.
            let Some(target) = slot else {
                return Err(TransferError::UploadRejected(format!(
                    "missing target for part {}",
                    planned.number
                )));
            };
            let start_matches = target.chunk_start.is_none_or(|s| s == planned.chunk_start);
            let end_matches = target.chunk_end.is_none_or(|e| e == planned.chunk_end);
            if !start_matches || !end_matches {
                return Err(TransferError::UploadRejected(format!(
                    "part {} range does not match the plan",
                    planned.number
                )));
            }
            targets.push(target);
        }

        Ok(Self {
            file_id: upload.id,
            upload_id: multipart.id,
            path: multipart.path,
            checksum: checksum.to_string(),
            targets,
        })
    }

    /// Upload targets in part-number order.
    pub fn targets(&self) -> &[S3FileUploadPart] {
        &self.targets
    }
}

/// Proof that one part was received by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub number: u32,
    /// Storage-assigned `ETag`, passed back verbatim on finalize.
    pub receipt_token: String,
    pub checksum: String,
}

impl From<CompletedPart> for S3FileUploadCompletedPart {
    fn from(part: CompletedPart) -> Self {
        S3FileUploadCompletedPart {
            number: part.number,
            checksum_etag: part.receipt_token,
            checksum_sha256_base64: Some(part.checksum),
        }
    }
}

/// Lifecycle of one [`TransferEngine`](crate::TransferEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    Buffering,
    Checksumming,
    Planning,
    Negotiating,
    UploadingParts,
    Finalizing,
    Done,
    Failed,
}

impl TransferState {
    /// `Done` and `Failed` are absorbing.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferState::Done | TransferState::Failed)
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferState::Idle => "idle",
            TransferState::Buffering => "buffering",
            TransferState::Checksumming => "checksumming",
            TransferState::Planning => "planning",
            TransferState::Negotiating => "negotiating",
            TransferState::UploadingParts => "uploading parts",
            TransferState::Finalizing => "finalizing",
            TransferState::Done => "done",
            TransferState::Failed => "failed",
        };
        f.write_str(s)
    }
}
