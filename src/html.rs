//! Final document assembly.
//!
//! [`HtmlBuilder`] collects page fragments, a title and a stylesheet and turns
//! them into one HTML document. [`build`](HtmlBuilder::build) only reads the
//! accumulated state, so calling it twice gives byte-identical output.

use maud::{DOCTYPE, Markup, PreEscaped, html};

pub const DEFAULT_DOCUMENT_TITLE: &str = "Книга путешествий";
pub const DEFAULT_LANG: &str = "ru";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlBuilder {
    pages: Vec<String>,
    title: Option<String>,
    lang: Option<String>,
    styles: String,
}

impl HtmlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one page fragment. Blank fragments are ignored.
    pub fn add_page(&mut self, page: impl Into<String>) -> &mut Self {
        let page = page.into();
        if !page.trim().is_empty() {
            self.pages.push(page);
        }
        self
    }

    pub fn add_pages<I, S>(&mut self, pages: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for page in pages {
            self.add_page(page);
        }
        self
    }

    /// Document title and language. A blank title or language keeps the
    /// default.
    pub fn set_head(&mut self, title: &str, lang: Option<&str>) -> &mut Self {
        let title = title.trim();
        self.title = (!title.is_empty()).then(|| title.to_string());
        self.lang = lang
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        self
    }

    pub fn set_styles(&mut self, css: impl Into<String>) -> &mut Self {
        self.styles = css.into();
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    pub fn build(&self) -> String {
        self.document().into_string()
    }

    fn document(&self) -> Markup {
        let title = self.title.as_deref().unwrap_or(DEFAULT_DOCUMENT_TITLE);
        let lang = self.lang.as_deref().unwrap_or(DEFAULT_LANG);
        // A stray `</style>` in user-provided CSS must not close the element.
        let css = self.styles.replace("</", "<\\/");
        html! {
            (DOCTYPE)
            html lang=(lang) {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    title { (title) }
                    style { (PreEscaped(css)) }
                }
                body {
                    div.book {
                        @for page in &self.pages {
                            (PreEscaped(page))
                        }
                    }
                }
            }
        }
    }
}

/// Escape text for HTML content or a double/single-quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Longest entity body we try to decode, e.g. `#x10FFFF`.
const MAX_ENTITY_LEN: usize = 8;

/// Undo [`escape_html`] (and maud's escaping) for attribute values.
///
/// Decodes the named entities HTML escapers emit plus decimal and hex
/// character references. Anything else is left as written.
pub fn unescape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest[1..]
            .find(';')
            .filter(|&end| end <= MAX_ENTITY_LEN)
            .and_then(|end| decode_entity(&rest[1..=end]).map(|c| (c, end + 2)));
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(body: &str) -> Option<char> {
    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = body.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_well_formed() {
        let html = HtmlBuilder::new().build();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<html lang="ru">"#));
        assert!(html.contains(r#"<meta charset="UTF-8">"#));
        assert!(html.contains(r#"name="viewport""#));
        assert!(html.contains("<title>Книга путешествий</title>"));
        assert!(html.contains(r#"<div class="book"></div>"#));
    }

    #[test]
    fn build_is_idempotent() {
        let mut builder = HtmlBuilder::new();
        builder
            .set_head("Балканы", None)
            .set_styles("body{color:red}")
            .add_page("<section>1</section>")
            .add_pages(["<section>2</section>", "<section>3</section>"]);
        assert_eq!(builder.page_count(), 3);
        assert_eq!(builder.build(), builder.build());
    }

    #[test]
    fn reset_gives_zero_pages_and_defaults() {
        let mut builder = HtmlBuilder::new();
        builder.set_head("X", Some("en")).add_page("<section>1</section>");
        builder.reset();
        assert_eq!(builder.page_count(), 0);
        assert_eq!(builder.build(), HtmlBuilder::new().build());
    }

    #[test]
    fn blank_title_and_pages_are_ignored() {
        let mut builder = HtmlBuilder::new();
        builder.set_head("   ", None).add_page("  \n").add_page(String::new());
        assert_eq!(builder.page_count(), 0);
        assert!(builder.build().contains("<title>Книга путешествий</title>"));
    }

    #[test]
    fn title_is_escaped_and_styles_cannot_break_out() {
        let mut builder = HtmlBuilder::new();
        builder
            .set_head("<b>Trip</b>", None)
            .set_styles("a{}</style><script>x</script>");
        let html = builder.build();
        assert!(html.contains("<title>&lt;b&gt;Trip&lt;/b&gt;</title>"));
        assert!(!html.contains("</style><script>"));
    }

    #[test]
    fn blank_lang_falls_back_to_default() {
        for lang in [Some(""), Some("   "), None] {
            let mut builder = HtmlBuilder::new();
            builder.set_head("X", lang);
            assert!(builder.build().contains(r#"<html lang="ru">"#), "{lang:?}");
        }
        let mut builder = HtmlBuilder::new();
        builder.set_head("X", Some(" en "));
        assert!(builder.build().contains(r#"<html lang="en">"#));
    }

    #[test]
    fn numeric_references_are_decoded() {
        assert_eq!(unescape_html("it&#39;s &#x27;q&#X27; &#1092;"), "it's 'q' ф");
        assert_eq!(unescape_html("a&apos;b&nbsp;c"), "a'b\u{a0}c");
        // Decoded once, not recursively.
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
    }

    #[test]
    fn unknown_or_broken_references_are_kept() {
        assert_eq!(unescape_html("AT&T"), "AT&T");
        assert_eq!(unescape_html("&bogus; &#xZZ; &#;"), "&bogus; &#xZZ; &#;");
        assert_eq!(unescape_html("&#1114112;"), "&#1114112;");
        assert_eq!(unescape_html("tail &"), "tail &");
        assert_eq!(unescape_html("w=1&h=2;"), "w=1&h=2;");
    }

    #[test]
    fn escape_roundtrip() {
        let raw = r#"a & b < c > "d" 'e'"#;
        assert_eq!(escape_html(raw), "a &amp; b &lt; c &gt; &quot;d&quot; &#39;e&#39;");
        assert_eq!(unescape_html(&escape_html(raw)), raw);
    }
}
