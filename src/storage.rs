//! Blob storage for exported templates.
//!
//! Configuration is via environment variables (see [`crate::config`]):
//! - `ROCKET_FORGE_BLOB_URL` - Base URL objects are `PUT` under
//! - `ROCKET_FORGE_BLOB_TOKEN` - Bearer token for the store (optional)

use std::future::Future;
use std::pin::Pin;

use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Blob storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Blob store rejected upload ({status}): {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("Blob store unavailable: {0}")]
    Unavailable(String),
}

pub type UploadFuture<'a> = Pin<Box<dyn Future<Output = Result<String, StorageError>> + Send + 'a>>;

/// Somewhere exported bytes can be stored and later fetched by URL.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, returning the URL they can be fetched from.
    fn upload<'a>(&'a self, bytes: Vec<u8>, key: &'a str, content_type: &'a str) -> UploadFuture<'a>;
}

/// Blob store speaking plain HTTP `PUT`.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl HttpBlobStore {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

impl BlobStore for HttpBlobStore {
    fn upload<'a>(&'a self, bytes: Vec<u8>, key: &'a str, content_type: &'a str) -> UploadFuture<'a> {
        Box::pin(async move {
            let url = self.object_url(key);
            let mut req = self
                .client
                .put(&url)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(bytes);
            if let Some(ref token) = self.token {
                req = req.bearer_auth(token);
            }

            let response = req.send().await?;
            let status = response.status();
            if status.is_success() {
                Ok(url)
            } else {
                let body = response.text().await.unwrap_or_default();
                Err(StorageError::Rejected { status, body })
            }
        })
    }
}
