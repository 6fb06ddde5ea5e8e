//! Part storage: PUTs of raw bytes to pre-signed URLs.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use polar_migrate_protocol::S3FileUploadPart;
use reqwest::header::{CONTENT_TYPE, ETAG, HeaderMap, HeaderName, HeaderValue};

use crate::ApiError;

/// Outcome of one part PUT that produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartResponse {
    pub status: u16,
    /// `ETag` header, if the backend sent one.
    pub receipt: Option<String>,
}

impl PartResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Destination for part bodies.
pub trait PartSink: Send + Sync {
    /// Uploads `body` to `target`. Transport failures are errors; any HTTP
    /// response, successful or not, is returned as a [`PartResponse`].
    fn put_part<'a>(
        &'a self,
        target: &'a S3FileUploadPart,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<PartResponse, ApiError>> + Send + 'a>>;
}

/// Uploads parts over HTTP.
///
/// Uses its own client without default headers: the pre-signed URL carries
/// the authorization, and an API bearer token must not leak to storage.
pub struct HttpPartSink {
    http: reqwest::Client,
}

impl HttpPartSink {
    pub fn new(timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }
}

/// Converts vendor headers into a `HeaderMap`, verbatim.
fn build_headers(target: &S3FileUploadPart) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::with_capacity(target.headers.len() + 1);
    for (name, value) in &target.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ApiError::InvalidHeader(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| ApiError::InvalidHeader(name.clone()))?;
        headers.insert(header_name, header_value);
    }
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
    }
    Ok(headers)
}

impl PartSink for HttpPartSink {
    fn put_part<'a>(
        &'a self,
        target: &'a S3FileUploadPart,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<PartResponse, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            let headers = build_headers(target)?;
            let resp = self
                .http
                .put(&target.url)
                .headers(headers)
                .body(body)
                .send()
                .await?;

            let receipt = resp
                .headers()
                .get(ETAG)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            Ok(PartResponse {
                status: resp.status().as_u16(),
                receipt,
            })
        })
    }
}
