//! Files API client: opening and finalizing multipart upload sessions.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use polar_migrate_protocol::{FileCreate, FileRead, FileUpload, FileUploadCompleted, Server};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::ApiError;

/// Remote side of an upload session.
///
/// Implemented over HTTP by [`FilesClient`]; tests substitute mocks.
pub trait SessionApi: Send + Sync {
    /// Opens an upload session and returns the per-part upload targets.
    fn create_file<'a>(
        &'a self,
        params: &'a FileCreate,
    ) -> Pin<Box<dyn Future<Output = Result<FileUpload, ApiError>> + Send + 'a>>;

    /// Finalizes the session for `file_id` with the collected part receipts.
    fn complete_file<'a>(
        &'a self,
        file_id: &'a str,
        completed: &'a FileUploadCompleted,
    ) -> Pin<Box<dyn Future<Output = Result<FileRead, ApiError>> + Send + 'a>>;
}

/// Polar Files API client.
pub struct FilesClient {
    http: reqwest::Client,
    base_url: String,
}

impl FilesClient {
    /// Creates a client for `server` authenticated with `access_token`.
    pub fn new(
        server: Server,
        access_token: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| ApiError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: server.api_base_url().to_string(),
        })
    }

    /// Overrides the API base URL (self-hosted or test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Performs an authenticated JSON POST.
    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(url = %url, "POST");
        let resp = self.http.post(&url).json(body).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl SessionApi for FilesClient {
    fn create_file<'a>(
        &'a self,
        params: &'a FileCreate,
    ) -> Pin<Box<dyn Future<Output = Result<FileUpload, ApiError>> + Send + 'a>> {
        Box::pin(self.post_json("/v1/files/", params))
    }

    fn complete_file<'a>(
        &'a self,
        file_id: &'a str,
        completed: &'a FileUploadCompleted,
    ) -> Pin<Box<dyn Future<Output = Result<FileRead, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            let endpoint = format!("/v1/files/{file_id}/uploaded");
            self.post_json(&endpoint, completed).await
        })
    }
}
