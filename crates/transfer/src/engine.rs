//! The transfer engine: one file, one multipart upload session.
//!
//! # Pipeline
//!
//! 1. **Buffer**: drain the byte source into memory
//! 2. **Checksum**: SHA-256 of the whole content
//! 3. **Plan**: split into parts, hashing each slice
//! 4. **Negotiate**: open the session, receive pre-signed part targets
//! 5. **Upload**: PUT each part, strictly in order
//! 6. **Finalize**: hand the part receipts back to the Files API

use std::future::Future;

use bytes::Bytes;
use polar_migrate_protocol::{FileCreate, FileRead, FileUploadCompleted, S3FileCreateMultipart};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::chunked::{checksum_bytes, plan_parts, prepare};
use crate::progress::{ProgressCallback, UploadedCallback};
use crate::session::SessionApi;
use crate::sink::PartSink;
use crate::types::{CompletedPart, PartPlan, SessionDescriptor, TransferRequest, TransferState};
use crate::{DEFAULT_CHUNK_SIZE, PartFailure, TransferError};

/// Uploads a single file through a [`SessionApi`] and a [`PartSink`].
///
/// An engine is single-use: after [`run`](Self::run) it is `Done` or
/// `Failed` for good. Independent engines may share collaborators and run
/// concurrently.
pub struct TransferEngine<'a> {
    session_api: &'a dyn SessionApi,
    sink: &'a dyn PartSink,
    chunk_size: usize,
    cancel: CancellationToken,
    on_progress: Option<ProgressCallback>,
    on_uploaded: Option<UploadedCallback>,
    state: TransferState,
}

impl<'a> TransferEngine<'a> {
    pub fn new(session_api: &'a dyn SessionApi, sink: &'a dyn PartSink) -> Self {
        Self {
            session_api,
            sink,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cancel: CancellationToken::new(),
            on_progress: None,
            on_uploaded: None,
            state: TransferState::Idle,
        }
    }

    /// Part size in bytes. 0 selects [`DEFAULT_CHUNK_SIZE`].
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Registers the progress observer (cumulative bytes, after each part).
    pub fn on_progress(mut self, callback: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Registers the completion observer, called once on success.
    pub fn on_uploaded(mut self, callback: impl Fn(&FileRead) + Send + Sync + 'static) -> Self {
        self.on_uploaded = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Runs the full pipeline for `request`.
    ///
    /// Any phase failure stops the pipeline and leaves the engine `Failed`.
    /// A retry needs a fresh engine and starts over from the byte source.
    pub async fn run(&mut self, request: TransferRequest) -> Result<FileRead, TransferError> {
        if self.state != TransferState::Idle {
            return Err(TransferError::EngineSpent(self.state));
        }

        let name = request.name.clone();
        match self.run_phases(request).await {
            Ok(record) => {
                self.state = TransferState::Done;
                info!(file = %name, id = %record.id, size = record.size, "file uploaded");
                if let Some(callback) = &self.on_uploaded {
                    callback(&record);
                }
                Ok(record)
            }
            Err(e) => {
                warn!(file = %name, state = %self.state, error = %e, "transfer failed");
                self.state = TransferState::Failed;
                Err(e)
            }
        }
    }

    async fn run_phases(&mut self, mut request: TransferRequest) -> Result<FileRead, TransferError> {
        self.enter(TransferState::Buffering)?;
        let content = self.cancellable(prepare(&mut request)).await?;

        self.enter(TransferState::Checksumming)?;
        let checksum = checksum_bytes(&content);

        self.enter(TransferState::Planning)?;
        let plan = plan_parts(&content, self.chunk_size);
        debug!(
            file = %request.name,
            size = plan.total_size(),
            parts = plan.len(),
            "planned parts"
        );

        self.enter(TransferState::Negotiating)?;
        let descriptor = self.negotiate_session(&request, &checksum, &plan).await?;

        self.enter(TransferState::UploadingParts)?;
        let completed = self.upload_parts(&content, &plan, &descriptor).await?;

        self.enter(TransferState::Finalizing)?;
        self.finalize(&descriptor, completed).await
    }

    /// Opens the upload session and validates the returned targets.
    pub async fn negotiate_session(
        &self,
        request: &TransferRequest,
        checksum: &str,
        plan: &PartPlan,
    ) -> Result<SessionDescriptor, TransferError> {
        let params = FileCreate {
            organization_id: request.organization_id.clone(),
            service: request.service,
            name: request.name.clone(),
            size: request.size,
            mime_type: request.mime_type.clone(),
            checksum_sha256_base64: checksum.to_string(),
            upload: S3FileCreateMultipart {
                parts: plan.to_create_parts(),
            },
            version: None,
        };

        let upload = self
            .cancellable(async {
                self.session_api
                    .create_file(&params)
                    .await
                    .map_err(|e| TransferError::UploadRejected(e.to_string()))
            })
            .await?;

        let descriptor = SessionDescriptor::from_upload(upload, plan, checksum)?;
        debug!(file_id = %descriptor.file_id, upload_id = %descriptor.upload_id, "session opened");
        Ok(descriptor)
    }

    /// Uploads every planned part and collects the receipts, in part order.
    pub async fn upload_parts(
        &self,
        content: &Bytes,
        plan: &PartPlan,
        descriptor: &SessionDescriptor,
    ) -> Result<Vec<CompletedPart>, TransferError> {
        let mut completed = Vec::with_capacity(plan.len());
        let mut uploaded: u64 = 0;

        // Storage rejects parts received out of order (checksums are verified
        // per part), so each PUT must finish before the next one is issued.
        // Do not parallelize within a transfer.
        for (part, target) in plan.parts().iter().zip(descriptor.targets()) {
            self.check_cancelled()?;

            let body = content.slice(part.range());
            debug!(part = part.number, bytes = part.len(), "uploading part");

            let response = self
                .cancellable(async {
                    self.sink.put_part(target, body).await.map_err(|e| {
                        TransferError::PartUploadFailed {
                            part_number: part.number,
                            cause: PartFailure::Transport(e.to_string()),
                        }
                    })
                })
                .await?;

            if !response.is_success() {
                return Err(TransferError::PartUploadFailed {
                    part_number: part.number,
                    cause: PartFailure::Status(response.status),
                });
            }

            let Some(receipt_token) = response.receipt else {
                return Err(TransferError::PartUploadFailed {
                    part_number: part.number,
                    cause: PartFailure::MissingReceipt,
                });
            };

            uploaded += part.len();
            completed.push(CompletedPart {
                number: part.number,
                receipt_token,
                checksum: part.checksum.clone(),
            });
            self.notify_progress(uploaded);
        }

        Ok(completed)
    }

    /// Completes the session. No retry: a failure here is terminal.
    pub async fn finalize(
        &self,
        descriptor: &SessionDescriptor,
        completed: Vec<CompletedPart>,
    ) -> Result<FileRead, TransferError> {
        let body = FileUploadCompleted {
            id: descriptor.upload_id.clone(),
            path: descriptor.path.clone(),
            parts: completed.into_iter().map(Into::into).collect(),
        };

        let record = self
            .cancellable(async {
                self.session_api
                    .complete_file(&descriptor.file_id, &body)
                    .await
                    .map_err(|e| TransferError::FinalizeFailed(e.to_string()))
            })
            .await?;

        match &record.checksum_sha256_base64 {
            Some(actual) if *actual != descriptor.checksum => {
                return Err(TransferError::ChecksumMismatch {
                    expected: descriptor.checksum.clone(),
                    actual: actual.clone(),
                });
            }
            _ => {}
        }

        Ok(record)
    }

    fn enter(&mut self, next: TransferState) -> Result<(), TransferError> {
        self.check_cancelled()?;
        debug!(from = %self.state, to = %next, "transfer state");
        self.state = next;
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), TransferError> {
        if self.cancel.is_cancelled() {
            Err(TransferError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Races `fut` against cancellation; a cancelled call is dropped mid-flight.
    async fn cancellable<T>(
        &self,
        fut: impl Future<Output = Result<T, TransferError>>,
    ) -> Result<T, TransferError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TransferError::Cancelled),
            result = fut => result,
        }
    }

    fn notify_progress(&self, uploaded: u64) {
        if let Some(callback) = &self.on_progress {
            callback(uploaded);
        }
    }
}

/// Uploads one file with a fresh engine and default settings.
pub async fn transfer(
    session_api: &dyn SessionApi,
    sink: &dyn PartSink,
    request: TransferRequest,
    on_progress: impl Fn(u64) + Send + Sync + 'static,
) -> Result<FileRead, TransferError> {
    TransferEngine::new(session_api, sink)
        .on_progress(on_progress)
        .run(request)
        .await
}
