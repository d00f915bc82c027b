//! PDF rendering.
//!
//! The book is HTML until the very end; a [`PdfRenderer`] turns it into a
//! PDF. The stock renderer is [`LazyRenderer`], which bootstraps an external
//! [`RenderEngine`] on first use through an [`EngineLoader`]:
//!
//! - concurrent `initialize` calls share one in-flight bootstrap
//! - a failed bootstrap empties the slot, so a later call can try again
//! - raw HTML is materialized into an [`OffscreenContainer`] sized to the page
//!   format; the container is removed after the engine returns, on success
//!   and on failure
//!
//! Render options are validated and normalized ([`RenderOptions::normalize`])
//! before any engine work starts.

pub mod container;

#[cfg(feature = "chrome")]
pub mod chrome;

pub use container::OffscreenContainer;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("render engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("invalid render options: {0}")]
    InvalidOptions(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("render engine failed: {0}")]
    Engine(String),
}

/// Render options as written in `[render]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// `[top, right, bottom, left]` in millimetres.
    pub margin: [f64; 4],
    /// Raster codec: `jpeg`, `png` or `webp`.
    pub image_type: String,
    /// Raster quality, 0-1.
    pub image_quality: f64,
    /// Raster scale factor, > 0.
    pub scale: f64,
    /// `a3`, `a4`, `a5`, `letter` or `legal`.
    pub format: String,
    /// `portrait` or `landscape`.
    pub orientation: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            margin: [10.0, 10.0, 14.0, 10.0],
            image_type: "jpeg".to_string(),
            image_quality: 0.92,
            scale: 2.0,
            format: "a4".to_string(),
            orientation: "portrait".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl PageFormat {
    /// Portrait `(width, height)` in millimetres.
    pub fn size_mm(self) -> (f64, f64) {
        match self {
            PageFormat::A3 => (297.0, 420.0),
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::A5 => (148.0, 210.0),
            PageFormat::Letter => (215.9, 279.4),
            PageFormat::Legal => (215.9, 355.6),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PageFormat::A3 => "a3",
            PageFormat::A4 => "a4",
            PageFormat::A5 => "a5",
            PageFormat::Letter => "letter",
            PageFormat::Legal => "legal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    pub fn mime(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Webp => "image/webp",
        }
    }
}

/// Validated options with canonical casing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedOptions {
    pub margin_mm: [f64; 4],
    pub image_kind: ImageKind,
    pub image_quality: f64,
    pub scale: f64,
    pub format: PageFormat,
    pub orientation: Orientation,
}

impl NormalizedOptions {
    /// `(width, height)` in millimetres after orientation.
    pub fn page_size_mm(&self) -> (f64, f64) {
        let (w, h) = self.format.size_mm();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    /// Printable width between the left and right margins.
    pub fn content_width_mm(&self) -> f64 {
        self.page_size_mm().0 - self.margin_mm[1] - self.margin_mm[3]
    }
}

impl RenderOptions {
    pub fn normalize(&self) -> Result<NormalizedOptions, RenderError> {
        let invalid = |msg: String| RenderError::InvalidOptions(msg);

        let format = match self.format.trim().to_ascii_lowercase().as_str() {
            "a3" => PageFormat::A3,
            "a4" => PageFormat::A4,
            "a5" => PageFormat::A5,
            "letter" => PageFormat::Letter,
            "legal" => PageFormat::Legal,
            _ => {
                return Err(invalid(format!(
                    "unknown page format '{}' (expected a3, a4, a5, letter or legal)",
                    self.format
                )));
            }
        };
        let orientation = match self.orientation.trim().to_ascii_lowercase().as_str() {
            "portrait" => Orientation::Portrait,
            "landscape" => Orientation::Landscape,
            _ => {
                return Err(invalid(format!(
                    "unknown orientation '{}' (expected portrait or landscape)",
                    self.orientation
                )));
            }
        };
        let image_kind = match self.image_type.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => ImageKind::Jpeg,
            "png" => ImageKind::Png,
            "webp" => ImageKind::Webp,
            _ => {
                return Err(invalid(format!(
                    "unknown image type '{}' (expected jpeg, png or webp)",
                    self.image_type
                )));
            }
        };
        if !(0.0..=1.0).contains(&self.image_quality) {
            return Err(invalid(format!(
                "image_quality {} is outside 0-1",
                self.image_quality
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(invalid(format!("scale {} must be positive", self.scale)));
        }
        if let Some(m) = self.margin.iter().find(|m| !(m.is_finite() && **m >= 0.0)) {
            return Err(invalid(format!("margin {m} must be a non-negative number")));
        }

        let normalized = NormalizedOptions {
            margin_mm: self.margin,
            image_kind,
            image_quality: self.image_quality,
            scale: self.scale,
            format,
            orientation,
        };
        let (w, h) = normalized.page_size_mm();
        let [top, right, bottom, left] = self.margin;
        if left + right >= w || top + bottom >= h {
            return Err(invalid(format!(
                "margins {:?} leave no printable area on {} paper",
                self.margin,
                format.as_str()
            )));
        }
        Ok(normalized)
    }
}

/// What to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderInput {
    /// A complete HTML document held in memory.
    Html(String),
    /// A document already on disk.
    Document(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfBlob {
    pub bytes: Vec<u8>,
}

impl PdfBlob {
    pub const MIME: &'static str = "application/pdf";

    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Previewable reference carrying the same bytes.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", Self::MIME, STANDARD.encode(&self.bytes))
    }
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Prepare the engine. Safe to call any number of times.
    async fn initialize(&self) -> Result<(), RenderError>;

    fn is_available(&self) -> bool;

    async fn render(
        &self,
        input: &RenderInput,
        options: &RenderOptions,
    ) -> Result<PdfBlob, RenderError>;

    async fn preview(
        &self,
        input: &RenderInput,
        options: &RenderOptions,
    ) -> Result<String, RenderError> {
        Ok(self.render(input, options).await?.to_data_url())
    }
}

/// A loaded engine that prints a document file to PDF bytes.
///
/// Engines are synchronous. They run on the caller's task.
pub trait RenderEngine: Send + Sync {
    fn print(&self, document: &Path, options: &NormalizedOptions) -> Result<Vec<u8>, RenderError>;
}

/// Loads the external engine.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn RenderEngine>, RenderError>;
}

type Bootstrap = Shared<BoxFuture<'static, Result<Arc<dyn RenderEngine>, String>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`PdfRenderer`] that loads its engine on first use.
pub struct LazyRenderer<L> {
    loader: Arc<L>,
    pending: Mutex<Option<Bootstrap>>,
    engine: OnceLock<Arc<dyn RenderEngine>>,
}

impl<L> fmt::Debug for LazyRenderer<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRenderer")
            .field("available", &self.engine.get().is_some())
            .finish_non_exhaustive()
    }
}

impl<L: EngineLoader + 'static> LazyRenderer<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader: Arc::new(loader),
            pending: Mutex::new(None),
            engine: OnceLock::new(),
        }
    }

    /// The in-flight bootstrap, started if none is pending.
    fn bootstrap(&self) -> Bootstrap {
        let mut slot = lock(&self.pending);
        if let Some(pending) = slot.as_ref() {
            return pending.clone();
        }
        let loader = Arc::clone(&self.loader);
        let task = async move { loader.load().await.map_err(|e| e.to_string()) }
            .boxed()
            .shared();
        *slot = Some(task.clone());
        task
    }
}

#[async_trait]
impl<L: EngineLoader + 'static> PdfRenderer for LazyRenderer<L> {
    async fn initialize(&self) -> Result<(), RenderError> {
        if self.engine.get().is_some() {
            return Ok(());
        }
        let task = self.bootstrap();
        match task.clone().await {
            Ok(engine) => {
                // Another caller of the same bootstrap may have stored it already.
                let _ = self.engine.set(engine);
                Ok(())
            }
            Err(reason) => {
                let mut slot = lock(&self.pending);
                if slot.as_ref().is_some_and(|pending| pending.ptr_eq(&task)) {
                    *slot = None;
                }
                log::warn!("render engine bootstrap failed: {reason}");
                Err(RenderError::EngineUnavailable(reason))
            }
        }
    }

    fn is_available(&self) -> bool {
        self.engine.get().is_some()
    }

    async fn render(
        &self,
        input: &RenderInput,
        options: &RenderOptions,
    ) -> Result<PdfBlob, RenderError> {
        let options = options.normalize()?;
        self.initialize().await?;
        let engine = self
            .engine
            .get()
            .cloned()
            .ok_or_else(|| RenderError::EngineUnavailable("engine not initialized".into()))?;

        let bytes = match input {
            RenderInput::Document(path) => engine.print(path, &options)?,
            RenderInput::Html(html) => {
                let container = OffscreenContainer::create(html, &options)?;
                let printed = engine.print(container.path(), &options);
                if let Err(e) = container.remove() {
                    log::warn!("could not remove render container: {e}");
                }
                printed?
            }
        };
        log::info!("Rendered PDF ({} bytes)", bytes.len());
        Ok(PdfBlob::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn options(format: &str, orientation: &str) -> RenderOptions {
        RenderOptions {
            format: format.into(),
            orientation: orientation.into(),
            ..Default::default()
        }
    }

    #[test]
    fn casing_is_normalized() {
        let n = RenderOptions {
            image_type: "PNG".into(),
            ..options(" A5 ", "Landscape")
        }
        .normalize()
        .unwrap();
        assert_eq!(n.format, PageFormat::A5);
        assert_eq!(n.orientation, Orientation::Landscape);
        assert_eq!(n.image_kind, ImageKind::Png);
        assert_eq!(n.page_size_mm(), (210.0, 148.0));
    }

    #[test]
    fn malformed_values_are_rejected_with_the_value() {
        for (opts, needle) in [
            (options("tabloid", "portrait"), "tabloid"),
            (options("a4", "sideways"), "sideways"),
            (
                RenderOptions {
                    image_type: "bmp".into(),
                    ..Default::default()
                },
                "bmp",
            ),
            (
                RenderOptions {
                    image_quality: 1.5,
                    ..Default::default()
                },
                "1.5",
            ),
            (
                RenderOptions {
                    scale: 0.0,
                    ..Default::default()
                },
                "scale",
            ),
            (
                RenderOptions {
                    margin: [10.0, -1.0, 10.0, 10.0],
                    ..Default::default()
                },
                "-1",
            ),
            (
                RenderOptions {
                    margin: [10.0, 110.0, 10.0, 110.0],
                    ..Default::default()
                },
                "printable",
            ),
        ] {
            match opts.normalize() {
                Err(RenderError::InvalidOptions(msg)) => assert!(msg.contains(needle), "{msg}"),
                other => panic!("expected InvalidOptions for {needle}, got {other:?}"),
            }
        }
    }

    #[test]
    fn content_width_subtracts_side_margins() {
        let n = RenderOptions::default().normalize().unwrap();
        assert_eq!(n.content_width_mm(), 190.0);
    }

    #[test]
    fn blob_preview_is_pdf_data_url() {
        let blob = PdfBlob::new(b"%PDF-1.7".to_vec());
        assert_eq!(blob.to_data_url(), "data:application/pdf;base64,JVBERi0xLjc=");
    }

    // -------------------------------------------------------------------------
    // LazyRenderer
    // -------------------------------------------------------------------------

    /// Engine that echoes the document it was given.
    struct EchoEngine {
        seen: Mutex<Vec<PathBuf>>,
        fail: bool,
    }

    impl RenderEngine for EchoEngine {
        fn print(&self, document: &Path, _: &NormalizedOptions) -> Result<Vec<u8>, RenderError> {
            assert!(document.exists(), "document must exist while printing");
            self.seen.lock().unwrap().push(document.to_path_buf());
            if self.fail {
                return Err(RenderError::Engine("boom".into()));
            }
            let html = std::fs::read_to_string(document)?;
            Ok(html.into_bytes())
        }
    }

    struct CountingLoader {
        loads: AtomicUsize,
        /// Loads that fail before one succeeds.
        failures: usize,
        engine: Arc<EchoEngine>,
    }

    impl CountingLoader {
        fn new(failures: usize, engine_fails: bool) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                failures,
                engine: Arc::new(EchoEngine {
                    seen: Mutex::new(Vec::new()),
                    fail: engine_fails,
                }),
            }
        }
    }

    #[async_trait]
    impl EngineLoader for CountingLoader {
        async fn load(&self) -> Result<Arc<dyn RenderEngine>, RenderError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            if n < self.failures {
                return Err(RenderError::EngineUnavailable("no engine".into()));
            }
            Ok(self.engine.clone())
        }
    }

    #[tokio::test]
    async fn concurrent_initialize_bootstraps_once() {
        let renderer = LazyRenderer::new(CountingLoader::new(0, false));
        assert!(!renderer.is_available());
        let (a, b, c) = tokio::join!(
            renderer.initialize(),
            renderer.initialize(),
            renderer.initialize()
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();
        renderer.initialize().await.unwrap();
        assert!(renderer.is_available());
        assert_eq!(renderer.loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_bootstrap_can_be_retried() {
        let renderer = LazyRenderer::new(CountingLoader::new(1, false));
        let (a, b) = tokio::join!(renderer.initialize(), renderer.initialize());
        assert!(matches!(a, Err(RenderError::EngineUnavailable(_))));
        assert!(matches!(b, Err(RenderError::EngineUnavailable(_))));
        assert!(!renderer.is_available());
        assert_eq!(renderer.loader.loads.load(Ordering::SeqCst), 1);

        renderer.initialize().await.unwrap();
        assert!(renderer.is_available());
        assert_eq!(renderer.loader.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn html_container_is_removed_after_success() {
        let renderer = LazyRenderer::new(CountingLoader::new(0, false));
        let html = "<html><head><style>.x{color:red}</style></head><body><p>hi</p></body></html>";
        let blob = renderer
            .render(&RenderInput::Html(html.into()), &RenderOptions::default())
            .await
            .unwrap();
        let printed = String::from_utf8(blob.bytes).unwrap();
        assert!(printed.contains(".x{color:red}"));
        assert!(printed.contains("<p>hi</p>"));

        let seen = renderer.loader.engine.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert!(!seen[0].exists());
    }

    #[tokio::test]
    async fn html_container_is_removed_after_failure() {
        let renderer = LazyRenderer::new(CountingLoader::new(0, true));
        let err = renderer
            .render(&RenderInput::Html("<p>x</p>".into()), &RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Engine(_)));
        let seen = renderer.loader.engine.seen.lock().unwrap().clone();
        assert!(!seen[0].exists());
        assert!(!seen[0].parent().unwrap().exists());
    }

    #[tokio::test]
    async fn invalid_options_fail_before_bootstrap() {
        let renderer = LazyRenderer::new(CountingLoader::new(0, false));
        let err = renderer
            .render(&RenderInput::Html("<p>x</p>".into()), &options("b5", "portrait"))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidOptions(_)));
        assert_eq!(renderer.loader.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn preview_wraps_the_rendered_blob() {
        let renderer = LazyRenderer::new(CountingLoader::new(0, false));
        let input = RenderInput::Html("<p>x</p>".into());
        let blob = renderer.render(&input, &RenderOptions::default()).await.unwrap();
        let preview = renderer.preview(&input, &RenderOptions::default()).await.unwrap();
        assert_eq!(preview, blob.to_data_url());
    }

    #[tokio::test]
    async fn documents_on_disk_are_printed_in_place() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("book.html");
        std::fs::write(&path, "<p>on disk</p>").unwrap();
        let renderer = LazyRenderer::new(CountingLoader::new(0, false));
        let blob = renderer
            .render(&RenderInput::Document(path.clone()), &RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(blob.bytes, b"<p>on disk</p>");
        assert!(path.exists());
    }
}
