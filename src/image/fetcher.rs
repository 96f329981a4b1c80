//! Network side of the image cache: download and string encoding.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use reqwest::header::CONTENT_TYPE;

use crate::error::{CacheError, Result};

const FALLBACK_MIME: &str = "application/octet-stream";

/// Raw response of a successful image download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FetchedImage {
    /// Encodes the body as a `data:` URI so it can live in string storage.
    pub fn to_data_uri(&self) -> String {
        let mime = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(FALLBACK_MIME);

        format!("data:{};base64,{}", mime, BASE64_STANDARD.encode(&self.bytes))
    }
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Issues one GET for `url`. Non-success responses are errors.
    async fn fetch(&self, url: &str) -> Result<FetchedImage>;
}

// == HTTP Fetcher ==
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CacheError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::fetch(url, format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CacheError::fetch(url, e))?;

        Ok(FetchedImage {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}
