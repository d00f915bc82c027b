//! Book cover.
//!
//! Background by [`CoverType`]: a fixed image, the theme gradient, or (auto)
//! the first record photo the image loader can actually resolve. Without a
//! loader, auto takes the first non-blank photo. When no image is available
//! the gradient is used.

use super::{PageData, PageError, PageGenerator, PageOptions, PageType, photo_src};
use crate::config::CoverType;
use crate::imaging::ImageLoader;
use crate::plural::{DAYS, TRAVELS};
use crate::types::TravelRecord;
use async_trait::async_trait;
use maud::html;
use std::sync::Arc;

pub struct CoverPage {
    loader: Option<Arc<ImageLoader>>,
}

impl CoverPage {
    pub fn new(loader: Option<Arc<ImageLoader>>) -> Self {
        Self { loader }
    }

    async fn background(
        &self,
        travels: &[TravelRecord],
        options: &PageOptions<'_>,
    ) -> Option<String> {
        let settings = options.settings;
        match settings.cover_type {
            CoverType::Gradient => None,
            CoverType::Fixed => settings
                .cover_image
                .as_deref()
                .and_then(|raw| photo_src(options, raw)),
            CoverType::Auto => {
                let mut candidates = travels
                    .iter()
                    .filter_map(TravelRecord::primary_photo)
                    .filter_map(|raw| photo_src(options, raw));
                let Some(loader) = &self.loader else {
                    return candidates.next();
                };
                for src in candidates {
                    match loader.load_image(&src).await {
                        Ok(_) => return Some(src),
                        Err(e) => log::debug!("cover candidate skipped: {e}"),
                    }
                }
                None
            }
        }
    }
}

#[async_trait(?Send)]
impl PageGenerator for CoverPage {
    async fn generate(
        &self,
        data: &PageData<'_>,
        _page_number: usize,
        options: &PageOptions<'_>,
    ) -> Result<String, PageError> {
        let PageData::Book { travels, meta } = data else {
            return Err(PageError::MissingData {
                page: PageType::Cover,
            });
        };
        let background = self.background(travels, options).await;
        let gradient = options.theme.cover_gradient_css();

        let markup = html! {
            section.pdf-page.cover-page {
                @match &background {
                    Some(src) => {
                        img.cover-bg src=(src) alt="";
                    }
                    None => {
                        div.cover-bg style={ "background: " (gradient) ";" } {}
                    }
                }
                div.cover-shade {}
                div.cover-content {
                    @if meta.show_title {
                        h1.cover-title { (meta.title) }
                    }
                    @if let Some(subtitle) = &meta.subtitle {
                        p.cover-subtitle { (subtitle) }
                    }
                    div.cover-stats {
                        span { (TRAVELS.count(meta.travel_count as u64)) }
                        @if let Some(years) = &meta.year_range {
                            span { (years) }
                        }
                        @if meta.total_days > 0 {
                            span { (DAYS.count(meta.total_days as u64)) }
                        }
                    }
                    @if let Some(author) = &meta.author {
                        p.cover-author { (author) }
                    }
                }
            }
        };
        Ok(markup.into_string())
    }

    fn estimate_page_count(&self, _data: &PageData<'_>, _options: &PageOptions<'_>) -> usize {
        1
    }
}
