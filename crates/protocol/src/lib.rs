//! Wire types for the Polar Files API.
//!
//! The migration uploader talks to two endpoints: `POST /v1/files/` to
//! open a multipart upload session and `POST /v1/files/{id}/uploaded` to
//! finalize it. Everything here is plain serde data; the HTTP plumbing
//! lives in `polar-migrate-transfer`.

pub mod files;
pub mod types;

pub use files::{
    FileCreate, FileRead, FileUpload, FileUploadCompleted, S3FileCreateMultipart,
    S3FileCreatePart, S3FileUploadCompletedPart, S3FileUploadMultipart, S3FileUploadPart,
};
pub use types::{FileService, Server};
