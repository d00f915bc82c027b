//! Off-screen render container.
//!
//! Raw HTML is not handed to the engine as-is: its styles are lifted out and
//! the body is wrapped in a container sized to the printable width of the
//! page format, inside a standalone document written to a temporary
//! directory. The directory lives exactly as long as the container.

use super::NormalizedOptions;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::TempDir;

static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").expect("valid regex"));
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body>").expect("valid regex"));
static LANG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<html\b[^>]*\blang="([^"]*)""#).expect("valid regex"));

const DOCUMENT_NAME: &str = "document.html";

#[derive(Debug)]
pub struct OffscreenContainer {
    dir: TempDir,
    document: PathBuf,
}

/// Style blocks of `html`, in document order.
pub fn extract_styles(html: &str) -> Vec<&str> {
    STYLE_RE.find_iter(html).map(|m| m.as_str()).collect()
}

/// Inner body markup, or the whole input for fragments.
pub fn extract_body(html: &str) -> &str {
    BODY_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map_or(html, |m| m.as_str())
}

/// Standalone print document for `html` at the given page geometry.
pub fn container_document(html: &str, options: &NormalizedOptions) -> String {
    let (width, height) = options.page_size_mm();
    let lang = LANG_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map_or("ru", |m| m.as_str());
    let body = if BODY_RE.is_match(html) {
        extract_body(html).to_string()
    } else {
        // A fragment may carry its own styles inline; keep them out of the body.
        STYLE_RE.replace_all(html, "").into_owned()
    };

    let mut doc = String::with_capacity(html.len() + 512);
    doc.push_str("<!DOCTYPE html>\n");
    doc.push_str(&format!("<html lang=\"{lang}\"><head><meta charset=\"UTF-8\">"));
    for style in extract_styles(html) {
        doc.push_str(style);
    }
    doc.push_str(&format!(
        "<style>@page {{ size: {width}mm {height}mm; }} \
         html, body {{ margin: 0; padding: 0; }} \
         .render-container {{ width: {:.2}mm; margin: 0 auto; }}</style>",
        options.content_width_mm()
    ));
    doc.push_str("</head><body><div class=\"render-container\">");
    doc.push_str(&body);
    doc.push_str("</div></body></html>\n");
    doc
}

impl OffscreenContainer {
    pub fn create(html: &str, options: &NormalizedOptions) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("travelbook-render-")
            .tempdir()?;
        let document = dir.path().join(DOCUMENT_NAME);
        std::fs::write(&document, container_document(html, options))?;
        log::debug!("render container at {}", dir.path().display());
        Ok(Self { dir, document })
    }

    /// The document the engine should print.
    pub fn path(&self) -> &Path {
        &self.document
    }

    pub fn remove(self) -> io::Result<()> {
        self.dir.close()
    }
}
