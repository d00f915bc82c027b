//! Resilient remote image loading.
//!
//! [`ImageLoader`] turns URLs into decoded [`LoadedImage`]s. Each attempt
//! (fetch + decode) runs under a timeout; failed attempts are retried with a
//! backoff delay. Outcomes are remembered per loader instance:
//!
//! - `loaded`: success cache, a hit returns immediately
//! - `failed`: URLs that exhausted their retries; they fail fast until
//!   [`retry_image`](ImageLoader::retry_image) or
//!   [`clear_cache`](ImageLoader::clear_cache)
//!
//! Batches run one after another and settle every load inside a batch, so at
//! most `batch_size` requests are in flight and one bad URL never aborts its
//! siblings.

use super::fetch::ImageFetcher;
use crate::config::LoaderConfig;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use image::ImageReader;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Delay before retry `n` (1-based).
pub type Backoff = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("{url}: failed earlier, not retried")]
    PreviouslyFailed { url: String },
    #[error("{url}: gave up after {attempts} attempt(s): {reason}")]
    Exhausted {
        url: String,
        attempts: u32,
        reason: String,
    },
}

impl LoadError {
    pub fn url(&self) -> &str {
        match self {
            LoadError::PreviouslyFailed { url } | LoadError::Exhausted { url, .. } => url,
        }
    }
}

/// A decoded image. Bytes are shared, clones are cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub mime: &'static str,
    pub bytes: Arc<[u8]>,
}

impl LoadedImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Height per unit of width, 1.0 when dimensions are unknown.
    pub fn height_ratio(&self) -> f64 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.height as f64 / self.width as f64
        }
    }
}

#[derive(Clone)]
pub struct LoaderOptions {
    pub timeout: Duration,
    pub max_retries: u32,
    pub batch_size: usize,
    pub backoff: Backoff,
    /// Container rewrites embed `data:` URIs instead of the original URL.
    pub inline: bool,
}

impl fmt::Debug for LoaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderOptions")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("batch_size", &self.batch_size)
            .field("inline", &self.inline)
            .finish_non_exhaustive()
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self::from_config(&LoaderConfig::default())
    }
}

impl LoaderOptions {
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_retries: config.max_retries,
            batch_size: config.batch_size.max(1),
            backoff: exponential_backoff(Duration::from_millis(config.retry_base_delay_ms)),
            inline: config.inline_images,
        }
    }

    pub fn with_backoff(mut self, backoff: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        self.backoff = Arc::new(backoff);
        self
    }
}

/// `base * 2^(n-1)`, capped at 30 s.
pub fn exponential_backoff(base: Duration) -> Backoff {
    Arc::new(move |retry: u32| {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        base.saturating_mul(factor).min(Duration::from_secs(30))
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    pub loaded: usize,
    pub failed: usize,
}

pub struct ImageLoader {
    fetcher: Arc<dyn ImageFetcher>,
    options: LoaderOptions,
    loaded: Mutex<HashMap<String, LoadedImage>>,
    failed: Mutex<HashSet<String>>,
}

impl fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageLoader")
            .field("options", &self.options)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ImageLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, options: LoaderOptions) -> Self {
        Self {
            fetcher,
            options,
            loaded: Mutex::new(HashMap::new()),
            failed: Mutex::new(HashSet::new()),
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Load `url`, failing fast when it already failed on this loader.
    pub async fn load_image(&self, url: &str) -> Result<LoadedImage, LoadError> {
        self.load(url, false).await
    }

    /// Load `url` even if it failed before.
    pub async fn retry_image(&self, url: &str) -> Result<LoadedImage, LoadError> {
        self.load(url, true).await
    }

    /// Successful cache lookup without any I/O.
    pub fn cached(&self, url: &str) -> Option<LoadedImage> {
        lock(&self.loaded).get(url).cloned()
    }

    pub fn has_failed(&self, url: &str) -> bool {
        lock(&self.failed).contains(url)
    }

    async fn load(&self, url: &str, force: bool) -> Result<LoadedImage, LoadError> {
        if let Some(hit) = self.cached(url) {
            log::debug!("image cache hit: {url}");
            return Ok(hit);
        }
        {
            let mut failed = lock(&self.failed);
            if force {
                failed.remove(url);
            } else if failed.contains(url) {
                return Err(LoadError::PreviouslyFailed {
                    url: url.to_string(),
                });
            }
        }

        let attempts = self.options.max_retries.saturating_add(1);
        let mut reason = String::new();
        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = (self.options.backoff)(attempt - 1);
                log::debug!("retrying {url} in {delay:?} (attempt {attempt}/{attempts}): {reason}");
                tokio::time::sleep(delay).await;
            }
            match tokio::time::timeout(self.options.timeout, self.attempt(url)).await {
                Ok(Ok(image)) => {
                    lock(&self.loaded).insert(url.to_string(), image.clone());
                    return Ok(image);
                }
                Ok(Err(e)) => reason = e,
                Err(_) => reason = format!("timed out after {:?}", self.options.timeout),
            }
        }

        log::warn!("image unavailable after {attempts} attempt(s): {url}: {reason}");
        lock(&self.failed).insert(url.to_string());
        Err(LoadError::Exhausted {
            url: url.to_string(),
            attempts,
            reason,
        })
    }

    async fn attempt(&self, url: &str) -> Result<LoadedImage, String> {
        let bytes = self.fetcher.fetch(url).await.map_err(|e| e.to_string())?;
        decode_image(url, bytes)
    }

    /// Load many URLs in sequential batches of `batch_size` concurrent loads.
    ///
    /// Duplicates collapse to one load. URLs already cached skip the network
    /// but are part of the result. `on_progress(done, total)` fires once per
    /// URL that needed loading, success or failure; `total` counts only those.
    /// The result holds successes only.
    pub async fn load_images_batch<S: AsRef<str>>(
        &self,
        urls: &[S],
        batch_size: usize,
        mut on_progress: impl FnMut(usize, usize),
    ) -> HashMap<String, LoadedImage> {
        let mut results = HashMap::new();
        let mut seen = HashSet::new();
        let mut work = Vec::new();
        for url in urls.iter().map(AsRef::as_ref) {
            if url.is_empty() || !seen.insert(url) {
                continue;
            }
            match self.cached(url) {
                Some(hit) => {
                    results.insert(url.to_string(), hit);
                }
                None => work.push(url),
            }
        }

        let total = work.len();
        let mut done = 0;
        for batch in work.chunks(batch_size.max(1)) {
            let mut pending: FuturesUnordered<_> = batch
                .iter()
                .map(|url| async move { (*url, self.load_image(url).await) })
                .collect();
            while let Some((url, outcome)) = pending.next().await {
                done += 1;
                on_progress(done, total);
                match outcome {
                    Ok(image) => {
                        results.insert(url.to_string(), image);
                    }
                    Err(e) => log::debug!("batch load failed: {e}"),
                }
            }
        }
        results
    }

    /// Forget every success and failure.
    pub fn clear_cache(&self) {
        lock(&self.loaded).clear();
        lock(&self.failed).clear();
    }

    pub fn stats(&self) -> LoaderStats {
        LoaderStats {
            loaded: lock(&self.loaded).len(),
            failed: lock(&self.failed).len(),
        }
    }
}

fn decode_image(url: &str, bytes: Vec<u8>) -> Result<LoadedImage, String> {
    if looks_like_svg(&bytes) {
        let (width, height) = svg_dimensions(&bytes);
        return Ok(LoadedImage {
            url: url.to_string(),
            width,
            height,
            mime: "image/svg+xml",
            bytes: bytes.into(),
        });
    }
    let reader = ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|e| format!("decode: {e}"))?;
    let format = reader
        .format()
        .ok_or_else(|| "decode: unrecognized image format".to_string())?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| format!("decode: {e}"))?;
    Ok(LoadedImage {
        url: url.to_string(),
        width,
        height,
        mime: format.to_mime_type(),
        bytes: bytes.into(),
    })
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

fn svg_dimensions(bytes: &[u8]) -> (u32, u32) {
    let text = String::from_utf8_lossy(bytes);
    let attr = |name: &str| -> u32 {
        let needle = format!(" {name}=\"");
        text.find(&needle)
            .map(|i| &text[i + needle.len()..])
            .and_then(|rest| {
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().ok()
            })
            .unwrap_or(0)
    };
    (attr("width"), attr("height"))
}
