//! Byte sources for the image loader.
//!
//! [`ImageFetcher`] is the network seam: the loader only ever asks for bytes
//! by URL. [`HttpFetcher`] is the production implementation; tests swap in
//! scripted fetchers.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::percent_decode_str;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("malformed data URL")]
    DataUrl,
    #[error("unsupported URL scheme: {0}")]
    Unsupported(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetches `http(s)://` over reqwest, reads `file://` from disk and decodes
/// `data:` URLs in place.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("travelbook/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(tokio::fs::read(path).await?);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FetchError::Unsupported(url.to_string()));
        }
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Decode the payload of a `data:` URL (base64 or percent-encoded).
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, FetchError> {
    let rest = url.strip_prefix("data:").ok_or(FetchError::DataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(FetchError::DataUrl)?;
    if meta.ends_with(";base64") {
        STANDARD
            .decode(payload.trim())
            .map_err(|_| FetchError::DataUrl)
    } else {
        Ok(percent_decode_str(payload).collect())
    }
}
