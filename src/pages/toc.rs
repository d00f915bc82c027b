//! Table of contents: one row per record with its starting page.

use super::{
    PageData, PageError, PageGenerator, PageOptions, PageType, TocEntry, book_title,
    page_number, running_header,
};
use async_trait::async_trait;
use maud::html;

/// Rows that fit on one contents page.
pub const ROWS_PER_PAGE: usize = 18;

pub struct TocPage;

/// `"Страна · 2021"`, either part optional.
fn entry_meta(entry: &TocEntry) -> Option<String> {
    let parts: Vec<String> = entry
        .country
        .iter()
        .cloned()
        .chain(entry.year.map(|y| y.to_string()))
        .collect();
    (!parts.is_empty()).then(|| parts.join(" · "))
}

fn page_count(entries: usize) -> usize {
    entries.div_ceil(ROWS_PER_PAGE).max(1)
}

#[async_trait(?Send)]
impl PageGenerator for TocPage {
    async fn generate(
        &self,
        data: &PageData<'_>,
        page_number_start: usize,
        options: &PageOptions<'_>,
    ) -> Result<String, PageError> {
        let PageData::Toc { entries } = data else {
            return Err(PageError::MissingData { page: PageType::Toc });
        };
        let title = book_title(options.settings);
        let mut out = String::new();
        for i in 0..page_count(entries.len()) {
            let rows = entries.iter().skip(i * ROWS_PER_PAGE).take(ROWS_PER_PAGE);
            let markup = html! {
                section.pdf-page.toc-page {
                    (running_header(title, "Содержание"))
                    @if i == 0 {
                        h2 { "Содержание" }
                    }
                    ol.toc-list {
                        @for entry in rows {
                            li.toc-item {
                                span.toc-name { (entry.name) }
                                @if let Some(meta) = entry_meta(entry) {
                                    span.toc-meta { (meta) }
                                }
                                span.toc-dots {}
                                span.toc-number { (entry.page) }
                            }
                        }
                    }
                    (page_number(page_number_start + i))
                }
            };
            out.push_str(&markup.into_string());
        }
        Ok(out)
    }

    fn estimate_page_count(&self, data: &PageData<'_>, _options: &PageOptions<'_>) -> usize {
        match data {
            PageData::Toc { entries } => page_count(entries.len()),
            _ => 1,
        }
    }
}
