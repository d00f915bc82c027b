//! Rich text → [`Block`] parsing.
//!
//! Markdown and plain text go through pulldown-cmark first, so both input
//! styles share one HTML walk over an html5ever DOM. The walk is lazy: a
//! [`Blocks`] iterator keeps a stack of `(node, next child)` frames and only
//! classifies nodes as they are pulled.

use super::Block;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use pulldown_cmark::{Options, Parser, html as md_html};
use regex::Regex;
use std::sync::LazyLock;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?[a-zA-Z][a-zA-Z0-9]*(\s[^>]*)?/?>").expect("tag pattern must compile")
});

/// Elements whose presence makes a wrapper a block container.
const BLOCK_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "ul", "ol", "blockquote", "img", "figure", "div",
    "section", "article", "main", "aside", "header", "footer", "table", "pre",
];

const WRAPPER_TAGS: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "aside", "header", "footer",
];

const SKIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "template", "noscript", "br", "hr", "iframe", "svg",
];

const INLINE_TAGS: &[&str] = &[
    "a", "b", "strong", "i", "em", "u", "s", "span", "small", "mark", "code", "sub", "sup",
    "abbr", "time", "q", "del", "ins",
];

/// Parsed rich text. Cheap to iterate repeatedly; every call to
/// [`blocks`](Self::blocks) starts a fresh walk.
#[derive(Clone, Default)]
pub struct ParsedContent {
    root: Option<Handle>,
}

impl std::fmt::Debug for ParsedContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedContent")
            .field("blocks", &self.blocks().count())
            .finish()
    }
}

/// Parse HTML or Markdown/plain text.
pub fn parse_content(raw: &str) -> ParsedContent {
    if raw.trim().is_empty() {
        return ParsedContent::default();
    }
    let html = if HTML_TAG.is_match(raw) {
        raw.to_string()
    } else {
        markdown_to_html(raw)
    };
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes());
    match dom {
        Ok(dom) => ParsedContent {
            root: Some(dom.document),
        },
        Err(e) => {
            log::debug!("rich text parse failed, keeping raw text: {e}");
            plain_fallback(raw)
        }
    }
}

fn plain_fallback(raw: &str) -> ParsedContent {
    let html = format!("<p>{}</p>", crate::html::escape_html(raw));
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .ok();
    ParsedContent {
        root: dom.map(|d| d.document),
    }
}

fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

impl ParsedContent {
    pub fn blocks(&self) -> Blocks {
        Blocks {
            stack: self
                .root
                .iter()
                .map(|node| Frame {
                    node: node.clone(),
                    next: 0,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks().next().is_none()
    }
}

/// Lazy block iterator over a parsed document.
pub struct Blocks {
    stack: Vec<Frame>,
}

struct Frame {
    node: Handle,
    next: usize,
}

enum Step {
    Emit(Block),
    Descend,
    Skip,
}

impl Iterator for Blocks {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        loop {
            let frame = self.stack.last_mut()?;
            let child = frame.node.children.borrow().get(frame.next).cloned();
            let Some(child) = child else {
                self.stack.pop();
                continue;
            };
            frame.next += 1;

            if is_inline(&child) {
                // Loose inline content: gather the whole run into one paragraph.
                let mut text = String::new();
                collect_text(&child, &mut text);
                loop {
                    let sibling = frame.node.children.borrow().get(frame.next).cloned();
                    match sibling {
                        Some(s) if is_inline(&s) => {
                            collect_text(&s, &mut text);
                            frame.next += 1;
                        }
                        _ => break,
                    }
                }
                if let Some(block) = paragraph(&text) {
                    return Some(block);
                }
                continue;
            }

            match classify(&child) {
                Step::Emit(block) => return Some(block),
                Step::Descend => self.stack.push(Frame {
                    node: child,
                    next: 0,
                }),
                Step::Skip => {}
            }
        }
    }
}

fn tag_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref().to_ascii_lowercase()),
        _ => None,
    }
}

fn is_inline(node: &Handle) -> bool {
    match &node.data {
        NodeData::Text { .. } => true,
        NodeData::Element { name, .. } => INLINE_TAGS.contains(&name.local.as_ref()),
        _ => false,
    }
}

fn attr(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn classify(node: &Handle) -> Step {
    let tag = match &node.data {
        NodeData::Document => return Step::Descend,
        NodeData::Element { .. } => tag_name(node).unwrap_or_default(),
        _ => return Step::Skip,
    };

    match tag.as_str() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse().unwrap_or(2);
            emit(heading(level, &text_of(node)))
        }
        "p" => match lone_image(node) {
            Some(image) => Step::Emit(image),
            None => emit(paragraph(&text_of(node))),
        },
        "ul" | "ol" => {
            let items: Vec<String> = node
                .children
                .borrow()
                .iter()
                .filter(|c| tag_name(c).as_deref() == Some("li"))
                .map(|li| normalize_text(&text_of(li)))
                .filter(|t| !t.is_empty())
                .collect();
            if items.is_empty() {
                Step::Skip
            } else {
                Step::Emit(Block::List {
                    ordered: tag == "ol",
                    items,
                })
            }
        }
        "blockquote" => emit(quote(node)),
        "img" => emit(image(node, None)),
        "figure" => match find_descendant(node, "img") {
            Some(img) => {
                let caption = find_descendant(node, "figcaption")
                    .map(|c| normalize_text(&text_of(&c)))
                    .filter(|c| !c.is_empty());
                emit(image(&img, caption))
            }
            None => emit(paragraph(&text_of(node))),
        },
        t if SKIPPED_TAGS.contains(&t) => Step::Skip,
        t if WRAPPER_TAGS.contains(&t) => {
            if t == "html" || t == "body" || has_block_children(node) {
                Step::Descend
            } else {
                emit(paragraph(&text_of(node)))
            }
        }
        _ => emit(paragraph(&text_of(node))),
    }
}

fn emit(block: Option<Block>) -> Step {
    block.map(Step::Emit).unwrap_or(Step::Skip)
}

fn heading(level: u8, raw: &str) -> Option<Block> {
    let text = normalize_text(raw);
    (!text.is_empty()).then_some(Block::Heading { level, text })
}

fn paragraph(raw: &str) -> Option<Block> {
    let text = normalize_text(raw);
    (!text.is_empty()).then_some(Block::Paragraph { text })
}

fn image(node: &Handle, caption: Option<String>) -> Option<Block> {
    let src = attr(node, "src").map(|s| s.trim().to_string())?;
    if src.is_empty() {
        return None;
    }
    let alt = attr(node, "alt").map(|a| normalize_text(&a)).unwrap_or_default();
    Some(Block::Image { src, alt, caption })
}

/// A paragraph that wraps nothing but one image.
fn lone_image(node: &Handle) -> Option<Block> {
    let img = find_descendant(node, "img")?;
    if !normalize_text(&text_of(node)).is_empty() {
        return None;
    }
    image(&img, None)
}

fn quote(node: &Handle) -> Option<Block> {
    let author = find_descendant(node, "cite")
        .or_else(|| find_descendant(node, "footer"))
        .map(|n| normalize_text(&text_of(&n)))
        .map(|a| a.trim_start_matches(['—', '-', '–', ' ']).to_string())
        .filter(|a| !a.is_empty());

    let mut text = String::new();
    collect_text_except(node, &["cite", "footer"], &mut text);
    let text = normalize_text(&text);
    (!text.is_empty()).then_some(Block::Quote { text, author })
}

fn has_block_children(node: &Handle) -> bool {
    node.children
        .borrow()
        .iter()
        .filter_map(tag_name)
        .any(|t| BLOCK_TAGS.contains(&t.as_str()))
}

fn find_descendant(node: &Handle, tag: &str) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        if tag_name(child).as_deref() == Some(tag) {
            return Some(child.clone());
        }
        if let Some(found) = find_descendant(child, tag) {
            return Some(found);
        }
    }
    None
}

fn text_of(node: &Handle) -> String {
    let mut text = String::new();
    collect_text(node, &mut text);
    text
}

fn collect_text(node: &Handle, out: &mut String) {
    collect_text_except(node, &[], out);
}

fn collect_text_except(node: &Handle, excluded: &[&str], out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        NodeData::Element { name, .. } => {
            let tag = name.local.as_ref();
            if excluded.contains(&tag) || tag == "script" || tag == "style" {
                return;
            }
            if tag == "br" {
                out.push(' ');
                return;
            }
            for child in node.children.borrow().iter() {
                collect_text_except(child, excluded, out);
            }
            // Block-level children must not glue words together.
            if !INLINE_TAGS.contains(&tag) {
                out.push(' ');
            }
        }
        _ => {
            for child in node.children.borrow().iter() {
                collect_text_except(child, excluded, out);
            }
        }
    }
}

/// Strip zero-width characters and collapse Unicode whitespace runs.
pub fn normalize_text(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}'))
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(raw: &str) -> Vec<Block> {
        parse_content(raw).blocks().collect()
    }

    #[test]
    fn html_headings_paragraphs_and_lists() {
        let got = blocks(
            "<h2>Маршрут</h2><p>Первый <b>день</b> в горах.</p><ul><li>Озеро</li><li> Перевал </li></ul>",
        );
        assert_eq!(
            got,
            vec![
                Block::Heading {
                    level: 2,
                    text: "Маршрут".into()
                },
                Block::Paragraph {
                    text: "Первый день в горах.".into()
                },
                Block::List {
                    ordered: false,
                    items: vec!["Озеро".into(), "Перевал".into()]
                },
            ]
        );
    }

    #[test]
    fn markdown_input_is_supported() {
        let got = blocks("# Title\n\nSome *text* here.\n\n1. one\n2. two\n");
        assert_eq!(got.len(), 3);
        assert!(matches!(&got[0], Block::Heading { level: 1, text } if text == "Title"));
        assert!(matches!(&got[1], Block::Paragraph { text } if text == "Some text here."));
        assert!(matches!(&got[2], Block::List { ordered: true, items } if items.len() == 2));
    }

    #[test]
    fn plain_text_becomes_paragraphs() {
        let got = blocks("Первый абзац.\n\nВторой абзац.");
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn quote_with_author() {
        let got = blocks("<blockquote>Дорога домой всегда короче.<cite>— Бабушка</cite></blockquote>");
        assert_eq!(
            got,
            vec![Block::Quote {
                text: "Дорога домой всегда короче.".into(),
                author: Some("Бабушка".into())
            }]
        );
    }

    #[test]
    fn figure_and_lone_image() {
        let got = blocks(
            r#"<figure><img src="https://x.test/a.jpg" alt="Горы"><figcaption>Утро</figcaption></figure><p><img src="https://x.test/b.jpg"></p>"#,
        );
        assert_eq!(
            got,
            vec![
                Block::Image {
                    src: "https://x.test/a.jpg".into(),
                    alt: "Горы".into(),
                    caption: Some("Утро".into())
                },
                Block::Image {
                    src: "https://x.test/b.jpg".into(),
                    alt: String::new(),
                    caption: None
                },
            ]
        );
    }

    #[test]
    fn wrappers_descend_or_flatten() {
        let got = blocks("<div><section><h3>A</h3><p>B</p></section></div><div>Just text</div>");
        assert_eq!(got.len(), 3);
        assert!(matches!(&got[2], Block::Paragraph { text } if text == "Just text"));
    }

    #[test]
    fn unknown_tags_degrade_to_paragraphs() {
        let got = blocks("<custom-widget>Keep <em>me</em></custom-widget><script>alert(1)</script>");
        assert_eq!(
            got,
            vec![Block::Paragraph {
                text: "Keep me".into()
            }]
        );
    }

    #[test]
    fn malformed_markup_never_fails() {
        let got = blocks("<p>Unclosed <b>bold <i>mix</p></div></span>");
        assert!(!got.is_empty());
        assert!(matches!(&got[0], Block::Paragraph { text } if text.contains("Unclosed")));
    }

    #[test]
    fn loose_inline_text_is_grouped() {
        let got = blocks("Hello <b>big</b> world<p>Next</p>");
        assert_eq!(
            got,
            vec![
                Block::Paragraph {
                    text: "Hello big world".into()
                },
                Block::Paragraph {
                    text: "Next".into()
                },
            ]
        );
    }

    #[test]
    fn blocks_iterator_is_restartable() {
        let parsed = parse_content("<p>a</p><p>b</p>");
        let first: Vec<Block> = parsed.blocks().collect();
        let second: Vec<Block> = parsed.blocks().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(parse_content("   ").is_empty());
        assert!(parse_content("<p>\u{200B} </p>").is_empty());
    }

    #[test]
    fn normalize_strips_zero_width_and_nbsp() {
        assert_eq!(
            normalize_text("  a\u{200B}b\u{00A0}\u{00A0}c\n\td\u{FEFF} "),
            "ab c d"
        );
    }
}
