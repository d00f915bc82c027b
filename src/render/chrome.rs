//! Headless Chrome print engine.
//!
//! Chrome prints vector PDF, so the raster options (`image_type`,
//! `image_quality`, `scale`) do not apply here; paper size, orientation
//! and margins do.

use super::{EngineLoader, NormalizedOptions, Orientation, RenderEngine, RenderError};
use async_trait::async_trait;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MM_PER_INCH: f64 = 25.4;

fn inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

fn engine_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Engine(e.to_string())
}

/// Launches a Chrome/Chromium binary on first use.
#[derive(Debug, Clone)]
pub struct ChromeLoader {
    /// Explicit binary; auto-detected when unset.
    pub binary: Option<PathBuf>,
    pub sandbox: bool,
}

impl ChromeLoader {
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self {
            binary,
            sandbox: true,
        }
    }
}

#[async_trait]
impl EngineLoader for ChromeLoader {
    async fn load(&self) -> Result<Arc<dyn RenderEngine>, RenderError> {
        let launch = LaunchOptions::default_builder()
            .path(self.binary.clone())
            .sandbox(self.sandbox)
            .headless(true)
            .build()
            .map_err(|e| RenderError::EngineUnavailable(e.to_string()))?;
        let browser =
            Browser::new(launch).map_err(|e| RenderError::EngineUnavailable(e.to_string()))?;
        log::info!("Started headless Chrome");
        Ok(Arc::new(ChromeEngine { browser }))
    }
}

pub struct ChromeEngine {
    browser: Browser,
}

/// CDP print parameters for the normalized options.
pub fn print_options(options: &NormalizedOptions) -> PrintToPdfOptions {
    let (width, height) = options.format.size_mm();
    let [top, right, bottom, left] = options.margin_mm;
    PrintToPdfOptions {
        landscape: Some(options.orientation == Orientation::Landscape),
        print_background: Some(true),
        paper_width: Some(inches(width)),
        paper_height: Some(inches(height)),
        margin_top: Some(inches(top)),
        margin_right: Some(inches(right)),
        margin_bottom: Some(inches(bottom)),
        margin_left: Some(inches(left)),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

impl RenderEngine for ChromeEngine {
    fn print(&self, document: &Path, options: &NormalizedOptions) -> Result<Vec<u8>, RenderError> {
        let absolute = std::fs::canonicalize(document)?;
        let url = format!("file://{}", absolute.display());

        let tab = self.browser.new_tab().map_err(engine_error)?;
        tab.navigate_to(&url)
            .map_err(engine_error)?
            .wait_until_navigated()
            .map_err(engine_error)?;
        let printed = tab.print_to_pdf(Some(print_options(options))).map_err(engine_error);
        if let Err(e) = tab.close(true) {
            log::debug!("could not close print tab: {e}");
        }
        printed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderOptions;

    #[test]
    fn print_options_are_in_inches() {
        let opts = RenderOptions {
            format: "letter".into(),
            orientation: "landscape".into(),
            margin: [25.4, 0.0, 12.7, 0.0],
            ..Default::default()
        }
        .normalize()
        .unwrap();
        let print = print_options(&opts);
        assert_eq!(print.landscape, Some(true));
        let close = |v: Option<f64>, want: f64| (v.unwrap() - want).abs() < 1e-9;
        assert!(close(print.paper_width, 8.5));
        assert!(close(print.paper_height, 11.0));
        assert!(close(print.margin_top, 1.0));
        assert!(close(print.margin_bottom, 0.5));
        assert_eq!(print.print_background, Some(true));
    }
}
