use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::FileService;

// ---------------------------------------------------------------------------
// Session creation (POST /v1/files/)
// ---------------------------------------------------------------------------

/// One planned part, announced when the upload session is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3FileCreatePart {
    /// 1-based part number.
    pub number: u32,
    /// Inclusive byte offset.
    pub chunk_start: u64,
    /// Exclusive byte offset.
    pub chunk_end: u64,
    pub checksum_sha256_base64: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3FileCreateMultipart {
    pub parts: Vec<S3FileCreatePart>,
}

/// Body of the session creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCreate {
    pub organization_id: String,
    pub service: FileService,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub checksum_sha256_base64: String,
    pub upload: S3FileCreateMultipart,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Pre-signed upload target for one part.
///
/// The API echoes the planned range and checksum alongside the URL; older
/// deployments omit them, hence the options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3FileUploadPart {
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_start: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_end: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_sha256_base64: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    /// Headers the storage backend requires on the PUT, attached verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3FileUploadMultipart {
    /// Storage-side multipart upload id, needed at finalize time.
    pub id: String,
    pub path: String,
    pub parts: Vec<S3FileUploadPart>,
}

/// Response of the session creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub organization_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub size: u64,
    pub upload: S3FileUploadMultipart,
}

// ---------------------------------------------------------------------------
// Finalize (POST /v1/files/{id}/uploaded)
// ---------------------------------------------------------------------------

/// Proof of receipt for one uploaded part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3FileUploadCompletedPart {
    pub number: u32,
    pub checksum_etag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_sha256_base64: Option<String>,
}

/// Body of the finalize request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUploadCompleted {
    /// Multipart upload id from [`S3FileUploadMultipart::id`].
    pub id: String,
    pub path: String,
    pub parts: Vec<S3FileUploadCompletedPart>,
}

/// Durable file record returned once an upload is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRead {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub path: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(default)]
    pub service: FileService,
    #[serde(default)]
    pub is_uploaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_sha256_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_sha256_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_readable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<String>,
}

fn is_zero_u64(v: &u64) -> bool {
    *v == 0
}
