//! Travel spread: a full-bleed photo page followed by a text page.

use super::{
    PageData, PageError, PageGenerator, PageOptions, PageType, book_title, page_number,
    photo_src, running_header,
};
use crate::blocks::{BlockContext, BlockRenderer, parse_content, render_blocks};
use crate::plural::format_days;
use crate::types::{TravelRecord, non_blank};
use async_trait::async_trait;
use maud::{Markup, html};
use std::rc::Rc;

/// Photos previewed on the text page before the "+N" badge takes over.
pub const INLINE_GALLERY_MAX: usize = 4;

pub struct TravelPage {
    renderer: Option<Rc<dyn BlockRenderer>>,
}

impl TravelPage {
    pub fn new(renderer: Option<Rc<dyn BlockRenderer>>) -> Self {
        Self { renderer }
    }

    fn photo_page(&self, record: &TravelRecord, options: &PageOptions<'_>) -> Markup {
        let hero = record.primary_photo().and_then(|raw| photo_src(options, raw));
        let year = record.year.map(|y| y.to_string());
        let days = record.days.and_then(format_days);
        html! {
            section.pdf-page.travel-photo-page {
                div.travel-hero {
                    @match &hero {
                        Some(src) => { img.travel-hero-img src=(src) alt=(record.name); }
                        None => { div.travel-hero-placeholder {} }
                    }
                }
                div.travel-hero-caption {
                    h1 { (record.name) }
                    div.travel-meta {
                        @for chip in [record.country_label(), year.as_deref(), days.as_deref()].into_iter().flatten() {
                            span.meta-chip { (chip) }
                        }
                    }
                }
            }
        }
    }

    fn text_page(
        &self,
        record: &TravelRecord,
        page: usize,
        options: &PageOptions<'_>,
    ) -> Markup {
        let ctx = BlockContext {
            theme: options.theme,
            proxy: options.proxy,
        };
        let sections = [
            ("Описание", &record.description),
            ("Плюсы", &record.highlights),
            ("Минусы", &record.drawbacks),
            ("Рекомендации", &record.recommendations),
        ];
        html! {
            section.pdf-page.travel-content-page {
                (running_header(book_title(options.settings), &record.name))
                @for (title, raw) in sections {
                    @if let Some(raw) = non_blank(raw.as_deref()) {
                        @let content = parse_content(raw);
                        @if !content.is_empty() {
                            div.travel-section {
                                h2.section-title { (title) }
                                (render_blocks(&content, self.renderer.as_deref(), &ctx))
                            }
                        }
                    }
                }
                (inline_gallery(record, options))
                (page_number(page))
            }
        }
    }
}

/// Up to four gallery photos; with more, the fourth carries a "+N" badge
/// for the rest.
fn inline_gallery(record: &TravelRecord, options: &PageOptions<'_>) -> Markup {
    let photos: Vec<String> = record
        .gallery
        .iter()
        .filter_map(|p| photo_src(options, &p.url))
        .collect();
    if photos.is_empty() {
        return html! {};
    }
    let shown = photos.len().min(INLINE_GALLERY_MAX);
    let hidden = photos.len() - shown;
    html! {
        div class={ "inline-gallery inline-gallery-" (shown) } {
            @for (i, src) in photos.iter().take(shown).enumerate() {
                div.inline-gallery-item {
                    img src=(src) alt={ (record.name) " " (i + 1) } loading="eager";
                    @if hidden > 0 && i + 1 == shown {
                        div.inline-gallery-more { "+" (hidden) }
                    }
                }
            }
        }
    }
}

#[async_trait(?Send)]
impl PageGenerator for TravelPage {
    async fn generate(
        &self,
        data: &PageData<'_>,
        page_number: usize,
        options: &PageOptions<'_>,
    ) -> Result<String, PageError> {
        let PageData::Travel(record) = data else {
            return Err(PageError::MissingData {
                page: PageType::Travel,
            });
        };
        let mut out = self.photo_page(record, options).into_string();
        out.push_str(&self.text_page(record, page_number + 1, options).into_string());
        Ok(out)
    }

    fn estimate_page_count(&self, _data: &PageData<'_>, _options: &PageOptions<'_>) -> usize {
        2
    }
}
