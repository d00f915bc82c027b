//! Book generation.
//!
//! Turns a record list and [`BookSettings`] into one HTML document. The
//! order of the book is fixed:
//!
//! 1. **Cover**
//! 2. **Contents** (when `include_toc`)
//! 3. Per record, in sorted order: **travel spread** (photo page + text page),
//!    then **gallery** (when `include_gallery`) and **map** (when `include_map`)
//! 4. **Checklists**, one page per configured section (when `include_checklists`)
//! 5. **Closing page**
//!
//! Page numbers are assigned up front from each generator's
//! `estimate_page_count`, so the contents page can point at pages that have
//! not been rendered yet.
//!
//! ## Images
//!
//! Every image URL goes through the [`ImageProxy`] before it is embedded.
//! When the generator has an [`ImageLoader`], the assembled document is
//! passed through the container rewrite: unreachable images become
//! placeholders and the run still produces a complete book.

use crate::config::{BookSettings, ConfigError, SortOrder};
use crate::html::{DEFAULT_DOCUMENT_TITLE, DEFAULT_LANG, HtmlBuilder};
use crate::imaging::{ContainerReport, ImageLoader, ImageProxy};
use crate::pages::{
    BookMeta, GeneratorDeps, PageData, PageError, PageGeneratorFactory, PageOptions, PageType,
    TocEntry,
};
use crate::theme::BookTheme;
use crate::types::{TravelRecord, non_blank};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("invalid settings: {0}")]
    Config(#[from] ConfigError),
    #[error("page generation failed: {0}")]
    Page(#[from] PageError),
}

/// One emitted block of pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub page_type: PageType,
    pub first_page: usize,
    pub pages: usize,
    /// Record name for per-travel pages, section label for checklists.
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSummary {
    pub title: String,
    pub travels: usize,
    pub year_range: Option<String>,
    pub pages: Vec<PageSummary>,
    /// Outcome of the image rewrite, when a loader was configured.
    pub images: Option<ContainerReport>,
}

impl BookSummary {
    pub fn page_count(&self) -> usize {
        self.pages.iter().map(|p| p.pages).sum()
    }

    pub fn count_of(&self, page_type: PageType) -> usize {
        self.pages
            .iter()
            .filter(|p| p.page_type == page_type)
            .map(|p| p.pages)
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedBook {
    pub html: String,
    pub summary: BookSummary,
}

/// Sort a copy of `records`. Sorting is stable: equal keys keep input order.
///
/// - `date-asc` / `date-desc` compare the year, missing years count as 0
/// - `country` groups by country name (case-insensitive); records without a
///   country go last
/// - `alphabetical` orders by travel name (case-insensitive)
pub fn sort_travels(records: &[TravelRecord], order: SortOrder) -> Vec<TravelRecord> {
    let mut sorted = records.to_vec();
    match order {
        SortOrder::DateAsc => sorted.sort_by_key(TravelRecord::sort_year),
        SortOrder::DateDesc => sorted.sort_by(|a, b| b.sort_year().cmp(&a.sort_year())),
        SortOrder::Country => sorted.sort_by_cached_key(|r| {
            let country = r.country_label().map(str::to_lowercase);
            (country.is_none(), country)
        }),
        SortOrder::Alphabetical => sorted.sort_by_cached_key(|r| r.name.trim().to_lowercase()),
    }
    sorted
}

/// `"2019–2023"`, or `"2021"` when every dated record shares the year.
pub fn year_range(records: &[TravelRecord]) -> Option<String> {
    let years = records.iter().filter_map(|r| r.year);
    let (min, max) = years.fold(None, |acc: Option<(i32, i32)>, y| match acc {
        None => Some((y, y)),
        Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
    })?;
    Some(if min == max {
        min.to_string()
    } else {
        format!("{min}–{max}")
    })
}

pub fn book_meta(records: &[TravelRecord], settings: &BookSettings) -> BookMeta {
    let configured = non_blank(Some(settings.title.as_str()));
    let countries: HashSet<String> = records
        .iter()
        .filter_map(TravelRecord::country_label)
        .map(str::to_lowercase)
        .collect();
    BookMeta {
        title: configured.unwrap_or(DEFAULT_DOCUMENT_TITLE).to_string(),
        show_title: configured.is_some(),
        subtitle: non_blank(settings.subtitle.as_deref()).map(str::to_string),
        author: non_blank(settings.author_name.as_deref()).map(str::to_string),
        year_range: year_range(records),
        travel_count: records.len(),
        total_days: records.iter().filter_map(|r| r.days).sum(),
        total_photos: records
            .iter()
            .map(|r| r.gallery.iter().filter(|p| !p.url.trim().is_empty()).count())
            .sum(),
        country_count: countries.len(),
    }
}

fn section_count(html: &str) -> usize {
    html.matches(r#"<section class="pdf-page"#).count()
}

/// Drives the page generators for one book at a time.
#[derive(Debug)]
pub struct BookGenerator {
    factory: PageGeneratorFactory,
    loader: Option<Arc<ImageLoader>>,
    origin: Option<String>,
}

impl Default for BookGenerator {
    fn default() -> Self {
        Self::new(GeneratorDeps::default())
    }
}

impl BookGenerator {
    pub fn new(deps: GeneratorDeps) -> Self {
        let loader = deps.image_loader.clone();
        Self {
            factory: PageGeneratorFactory::new(deps),
            loader,
            origin: None,
        }
    }

    /// Origin for site-relative image paths.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn factory(&self) -> &PageGeneratorFactory {
        &self.factory
    }

    pub async fn generate(
        &self,
        records: &[TravelRecord],
        settings: &BookSettings,
    ) -> Result<GeneratedBook, GenerateError> {
        settings.validate()?;
        let theme = BookTheme::named(&settings.theme).unwrap_or_default();
        let mut proxy = ImageProxy::new(settings.image_quality);
        if let Some(origin) = &self.origin {
            proxy = proxy.with_origin(origin.clone());
        }
        let options = PageOptions {
            settings,
            theme: &theme,
            proxy: &proxy,
        };

        let travels = sort_travels(records, settings.sort_order);
        let meta = book_meta(&travels, settings);
        log::info!(
            "Generating '{}': {} travel(s), sort order {:?}",
            meta.title,
            travels.len(),
            settings.sort_order
        );

        let cover = self.factory.create(PageType::Cover);
        let toc = self.factory.create(PageType::Toc);
        let travel = self.factory.create(PageType::Travel);
        let gallery = self.factory.create(PageType::Gallery);
        let map = self.factory.create(PageType::Map);

        // Contents first, so its size is known before numbering the spreads.
        let mut entries: Vec<TocEntry> = travels
            .iter()
            .map(|r| TocEntry {
                name: r.name.clone(),
                country: r.country_label().map(str::to_string),
                year: r.year,
                page: 0,
            })
            .collect();
        let toc_pages = if settings.include_toc {
            toc.estimate_page_count(&PageData::Toc { entries: &entries }, &options)
        } else {
            0
        };
        let mut next = 1 + 1 + toc_pages;
        for (entry, record) in entries.iter_mut().zip(&travels) {
            entry.page = next;
            let data = PageData::Travel(record);
            next += travel.estimate_page_count(&data, &options);
            if settings.include_gallery {
                next += gallery.estimate_page_count(&data, &options);
            }
            if settings.include_map {
                next += map.estimate_page_count(&data, &options);
            }
        }

        let mut emitter = Emitter::default();
        let book = PageData::Book {
            travels: &travels,
            meta: &meta,
        };
        let html = cover.generate(&book, emitter.next_page(), &options).await?;
        emitter.push(PageType::Cover, None, html);
        if settings.include_toc {
            let data = PageData::Toc { entries: &entries };
            let html = toc.generate(&data, emitter.next_page(), &options).await?;
            emitter.push(PageType::Toc, None, html);
        }

        for (record, entry) in travels.iter().zip(&entries) {
            if emitter.next_page() != entry.page {
                log::warn!(
                    "contents lists '{}' on page {} but it starts on page {}",
                    record.name,
                    entry.page,
                    emitter.next_page()
                );
            }
            let data = PageData::Travel(record);
            let label = || Some(record.name.clone());
            let html = travel.generate(&data, emitter.next_page(), &options).await?;
            emitter.push(PageType::Travel, label(), html);
            if settings.include_gallery {
                let html = gallery.generate(&data, emitter.next_page(), &options).await?;
                emitter.push(PageType::Gallery, label(), html);
            }
            if settings.include_map {
                let html = map.generate(&data, emitter.next_page(), &options).await?;
                emitter.push(PageType::Map, label(), html);
            }
        }

        let sections = settings.effective_checklist_sections();
        if !sections.is_empty() {
            let checklist = self.factory.create(PageType::Checklist);
            for section in sections {
                let data = PageData::Checklist(section);
                let html = checklist.generate(&data, emitter.next_page(), &options).await?;
                emitter.push(PageType::Checklist, Some(section.label().to_string()), html);
            }
        }

        let closing = self.factory.create(PageType::Final);
        let html = closing.generate(&book, emitter.next_page(), &options).await?;
        emitter.push(PageType::Final, None, html);

        let mut builder = HtmlBuilder::new();
        builder
            .set_head(&meta.title, Some(DEFAULT_LANG))
            .set_styles(theme.base_css())
            .add_pages(emitter.fragments);
        let mut html = builder.build();

        let images = match &self.loader {
            Some(loader) => {
                let report = loader
                    .load_images_from_container(&mut html, |done, total| {
                        log::debug!("images: {done}/{total}");
                    })
                    .await;
                log::info!(
                    "Images: {} loaded, {} replaced by placeholders",
                    report.loaded,
                    report.replaced
                );
                Some(report)
            }
            None => None,
        };

        let summary = BookSummary {
            title: meta.title.clone(),
            travels: travels.len(),
            year_range: meta.year_range.clone(),
            pages: emitter.summary,
            images,
        };
        log::info!("Generated {} page(s)", summary.page_count());
        Ok(GeneratedBook { html, summary })
    }
}

/// Collects fragments and tracks the running page number.
#[derive(Default)]
struct Emitter {
    fragments: Vec<String>,
    summary: Vec<PageSummary>,
    pages: usize,
}

impl Emitter {
    fn next_page(&self) -> usize {
        self.pages + 1
    }

    fn push(&mut self, page_type: PageType, label: Option<String>, fragment: String) {
        let pages = section_count(&fragment);
        if pages == 0 {
            return;
        }
        self.summary.push(PageSummary {
            page_type,
            first_page: self.next_page(),
            pages,
            label,
        });
        self.pages += pages;
        self.fragments.push(fragment);
    }
}
