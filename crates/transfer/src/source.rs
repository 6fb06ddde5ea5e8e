//! Turning a staged local file into a [`TransferRequest`].

use std::path::Path;

use tracing::debug;

use crate::TransferError;
use crate::types::TransferRequest;
use crate::validation::validate_file_name;

/// MIME type used when the extension is unknown.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

impl TransferRequest {
    /// Opens a local file for upload as a downloadable of `organization_id`.
    ///
    /// The stored name is the file's base name; the MIME type is derived
    /// from its extension.
    pub async fn open(
        organization_id: impl Into<String>,
        path: &Path,
    ) -> Result<Self, TransferError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| TransferError::InvalidFileName(path.display().to_string()))?;
        validate_file_name(name)?;

        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        let mime_type = detect_mime_type(path);

        debug!(path = %path.display(), size, mime_type, "opened file for transfer");

        Ok(TransferRequest::new(
            organization_id,
            name,
            mime_type,
            size,
            file,
        ))
    }
}

/// Detects a MIME type from the file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("epub") => "application/epub+zip",
        Some("zip") => "application/zip",
        Some("gz" | "tgz") => "application/gzip",
        Some("tar") => "application/x-tar",
        Some("7z") => "application/x-7z-compressed",
        Some("rar") => "application/vnd.rar",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("html" | "htm") => "text/html",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("woff2") => "font/woff2",
        _ => FALLBACK_MIME_TYPE,
    }
}
