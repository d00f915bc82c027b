//! In-place image rewriting for assembled documents.
//!
//! Every `<img>` source in a fragment (double-quoted, single-quoted or bare)
//! is loaded through the batch path; the
//! reference is then rewritten so the document never shows a broken image.
//! Failed sources get an inline placeholder and keep the original URL in
//! `data-original-src`.

use super::loader::{ImageLoader, LoadedImage};
use crate::html::{escape_html, unescape_html};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::LazyLock;

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("img pattern must compile")
});

/// One attribute: name, then an optional double-quoted, single-quoted or
/// unquoted value.
static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("attribute pattern must compile")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Double,
    Single,
    Bare,
}

/// The `src` attribute of an `<img>` tag.
#[derive(Debug)]
struct SrcAttr {
    /// Byte range of the value in the tag, quotes included.
    span: Range<usize>,
    quote: Quote,
    /// Unescaped, trimmed value.
    url: String,
}

fn find_src(tag: &str) -> Option<SrcAttr> {
    // Skip the `<img` name itself.
    let offset = "<img".len();
    let attrs = tag.get(offset..)?;
    for caps in ATTR.captures_iter(attrs) {
        if !caps[1].eq_ignore_ascii_case("src") {
            continue;
        }
        let (value, quote) = if let Some(v) = caps.get(2) {
            (v, Quote::Double)
        } else if let Some(v) = caps.get(3) {
            (v, Quote::Single)
        } else {
            (caps.get(4)?, Quote::Bare)
        };
        let span = match quote {
            Quote::Bare => value.start() + offset..value.end() + offset,
            _ => value.start() + offset - 1..value.end() + offset + 1,
        };
        return Some(SrcAttr {
            span,
            quote,
            url: unescape_html(value.as_str().trim()),
        });
    }
    None
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '=' | '<' | '>' | '`'))
}

/// `value` escaped and quoted the way the original attribute was. A bare
/// value that would need quoting gets double quotes.
fn quoted(value: &str, quote: Quote) -> String {
    let escaped = escape_html(value);
    match quote {
        Quote::Single => format!("'{escaped}'"),
        Quote::Bare if !needs_quotes(&escaped) => escaped,
        _ => format!("\"{escaped}\""),
    }
}

/// Neutral 400×300 picture frame shown in place of an image that could not
/// be loaded.
pub const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="300" viewBox="0 0 400 300"><rect width="400" height="300" fill="rgb(243,244,246)"/><path d="M130 200 L180 140 L215 180 L240 155 L280 200 Z" fill="rgb(209,213,219)"/><circle cx="250" cy="115" r="16" fill="rgb(209,213,219)"/><text x="200" y="240" font-family="sans-serif" font-size="14" text-anchor="middle" fill="rgb(156,163,175)">Изображение недоступно</text></svg>"##;

pub fn placeholder_data_url() -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(PLACEHOLDER_SVG)
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerReport {
    /// Distinct remote sources found.
    pub sources: usize,
    pub loaded: usize,
    /// `<img>` tags switched to the placeholder.
    pub replaced: usize,
}

/// Distinct non-`data:` image sources, in document order, attribute-unescaped.
pub fn image_sources(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    IMG_TAG
        .find_iter(html)
        .filter_map(|tag| find_src(tag.as_str()))
        .map(|src| src.url)
        .filter(|src| !src.is_empty() && !src.starts_with("data:"))
        .filter(|src| seen.insert(src.clone()))
        .collect()
}

impl ImageLoader {
    /// Load every image referenced by `container` and rewrite the references.
    pub async fn load_images_from_container(
        &self,
        container: &mut String,
        on_progress: impl FnMut(usize, usize),
    ) -> ContainerReport {
        let sources = image_sources(container);
        if sources.is_empty() {
            return ContainerReport::default();
        }
        let loaded = self
            .load_images_batch(&sources, self.options().batch_size, on_progress)
            .await;

        let placeholder = placeholder_data_url();
        let inline = self.options().inline;
        let mut replaced = 0;
        let rewritten = IMG_TAG.replace_all(container, |caps: &Captures| {
            let (tag, fell_back) = rewrite_tag(&caps[0], &loaded, &placeholder, inline);
            if fell_back {
                replaced += 1;
            }
            tag
        });
        *container = rewritten.into_owned();

        ContainerReport {
            sources: sources.len(),
            loaded: loaded.len(),
            replaced,
        }
    }
}

fn rewrite_tag(
    tag: &str,
    loaded: &HashMap<String, LoadedImage>,
    placeholder: &str,
    inline: bool,
) -> (String, bool) {
    let Some(attr) = find_src(tag) else {
        return (tag.to_string(), false);
    };
    let url = attr.url;
    if url.is_empty() || url.starts_with("data:") {
        return (tag.to_string(), false);
    }

    let (src, fell_back) = match loaded.get(&url) {
        Some(image) if inline => (image.data_url(), false),
        Some(_) => (url.clone(), false),
        None => (placeholder.to_string(), true),
    };
    let mut out = String::with_capacity(tag.len() + src.len());
    out.push_str(&tag[..attr.span.start]);
    out.push_str(&quoted(&src, attr.quote));
    out.push_str(&tag[attr.span.end..]);
    if fell_back {
        let marker = format!(
            " data-original-src=\"{}\" data-image-loader-fallback=\"true\"",
            escape_html(&url)
        );
        out.insert_str("<img".len(), &marker);
    }
    (out, fell_back)
}
