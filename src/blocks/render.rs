//! Block → markup templates.
//!
//! Every block kind has exactly one template, [`render_block_markup`]. A
//! [`BlockRenderer`] may be plugged into the page generators; when none is
//! supplied they call the templates directly, so output is the same either way.
//! All text goes through maud interpolation and is escaped.

use super::{Block, ParsedContent};
use crate::imaging::ImageProxy;
use crate::theme::BookTheme;
use maud::{Markup, html};

/// What a block template may look at.
#[derive(Debug, Clone, Copy)]
pub struct BlockContext<'a> {
    pub theme: &'a BookTheme,
    pub proxy: &'a ImageProxy,
}

pub trait BlockRenderer {
    fn render_block(&self, block: &Block, ctx: &BlockContext<'_>) -> Markup;
}

/// The stock renderer: the per-kind templates.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateBlockRenderer;

impl BlockRenderer for TemplateBlockRenderer {
    fn render_block(&self, block: &Block, ctx: &BlockContext<'_>) -> Markup {
        render_block_markup(block, ctx)
    }
}

/// Render every block of `content`, through `renderer` when one is supplied.
pub fn render_blocks(
    content: &ParsedContent,
    renderer: Option<&dyn BlockRenderer>,
    ctx: &BlockContext<'_>,
) -> Markup {
    html! {
        @for block in content.blocks() {
            @match renderer {
                Some(r) => { (r.render_block(&block, ctx)) }
                None => { (render_block_markup(&block, ctx)) }
            }
        }
    }
}

pub fn render_block_markup(block: &Block, ctx: &BlockContext<'_>) -> Markup {
    match block {
        Block::Heading { level, text } => match level {
            1 => html! { h1.block-heading { (text) } },
            2 => html! { h2.block-heading { (text) } },
            3 => html! { h3.block-heading { (text) } },
            4 => html! { h4.block-heading { (text) } },
            5 => html! { h5.block-heading { (text) } },
            _ => html! { h6.block-heading { (text) } },
        },
        Block::Paragraph { text } => html! { p.block-paragraph { (text) } },
        Block::List { ordered, items } => {
            if *ordered {
                html! { ol.block-list { @for item in items { li { (item) } } } }
            } else {
                html! { ul.block-list { @for item in items { li { (item) } } } }
            }
        }
        Block::Quote { text, author } => html! {
            blockquote.block-quote {
                p { (text) }
                @if let Some(author) = author {
                    cite { "— " (author) }
                }
            }
        },
        Block::Image { src, alt, caption } => match ctx.proxy.rewrite(src) {
            Some(url) => html! {
                figure.block-image {
                    img src=(url) alt=(alt) loading="eager";
                    @if let Some(caption) = caption {
                        figcaption { (caption) }
                    }
                }
            },
            None => html! {},
        },
    }
}
