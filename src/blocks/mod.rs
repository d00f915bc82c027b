//! Block model for rich travel text.
//!
//! Travel descriptions arrive as HTML (from the app's editor) or Markdown/plain
//! text (older records). [`parse_content`] turns either into a
//! [`ParsedContent`] whose [`blocks`](ParsedContent::blocks) iterator yields a
//! small closed set of [`Block`] variants. [`render`] maps them back to markup
//! with one fixed template per kind.
//!
//! Parsing never fails: markup the parser does not understand becomes a
//! paragraph of its text.

mod parser;
pub mod render;

pub use parser::{Blocks, ParsedContent, normalize_text, parse_content};
pub use render::{BlockContext, BlockRenderer, TemplateBlockRenderer, render_block_markup, render_blocks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    List {
        ordered: bool,
        items: Vec<String>,
    },
    Quote {
        text: String,
        author: Option<String>,
    },
    Image {
        src: String,
        alt: String,
        caption: Option<String>,
    },
}

impl Block {
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Heading { .. } => "heading",
            Block::Paragraph { .. } => "paragraph",
            Block::List { .. } => "list",
            Block::Quote { .. } => "quote",
            Block::Image { .. } => "image",
        }
    }
}
