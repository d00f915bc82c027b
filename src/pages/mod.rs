//! Page generators.
//!
//! Each generator produces the markup for one page archetype. They share one
//! contract, [`PageGenerator`]: `generate` turns [`PageData`] into HTML for
//! one or more consecutive `<section class="pdf-page">` elements, and
//! `estimate_page_count` says how many sections that will be, so the
//! orchestrator can number pages before anything is rendered.
//!
//! Page numbers are always supplied by the caller. Generators keep no state
//! between calls, so the orchestrator can drive them across many records in
//! any order.
//!
//! | Type | Data | Pages |
//! |---|---|---|
//! | [`PageType::Cover`] | [`PageData::Book`] | 1 |
//! | [`PageType::Toc`] | [`PageData::Toc`] | 1 per [`toc::ROWS_PER_PAGE`] entries |
//! | [`PageType::Travel`] | [`PageData::Travel`] | 2 (photo + text) |
//! | [`PageType::Gallery`] | [`PageData::Travel`] | 1 per `photos_per_page` photos, 0 without photos |
//! | [`PageType::Map`] | [`PageData::Travel`] | 1, 0 without waypoints |
//! | [`PageType::Checklist`] | [`PageData::Checklist`] | 1 |
//! | [`PageType::Final`] | [`PageData::Book`] | 1 |

pub mod checklist;
pub mod cover;
pub mod final_page;
pub mod gallery;
pub mod map;
pub mod toc;
pub mod travel;

use crate::blocks::BlockRenderer;
use crate::config::{BookSettings, ChecklistSection};
use crate::imaging::{ImageLoader, ImageProxy};
use crate::theme::BookTheme;
use crate::types::{GeoPoint, TravelRecord};
use async_trait::async_trait;
use maud::{Markup, html};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub use checklist::ChecklistPage;
pub use cover::CoverPage;
pub use final_page::FinalPage;
pub use gallery::GalleryPage;
pub use map::MapPage;
pub use toc::TocPage;
pub use travel::TravelPage;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("unknown page type: '{0}'")]
    UnknownPageType(String),
    #[error("{page} page generator received the wrong page data")]
    MissingData { page: PageType },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageType {
    Cover,
    Toc,
    Travel,
    Gallery,
    Map,
    Checklist,
    Final,
}

impl PageType {
    pub const ALL: [PageType; 7] = [
        PageType::Cover,
        PageType::Toc,
        PageType::Travel,
        PageType::Gallery,
        PageType::Map,
        PageType::Checklist,
        PageType::Final,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PageType::Cover => "cover",
            PageType::Toc => "toc",
            PageType::Travel => "travel",
            PageType::Gallery => "gallery",
            PageType::Map => "map",
            PageType::Checklist => "checklist",
            PageType::Final => "final",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageType {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PageError::UnknownPageType(s.to_string()))
    }
}

/// Aggregates derived from the sorted record list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookMeta {
    /// Title to display; falls back to a default when the configured one is blank.
    pub title: String,
    /// False when the configured title was blank: the cover then has no heading.
    pub show_title: bool,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    /// `"2019–2023"`, or a single year when all records share it.
    pub year_range: Option<String>,
    pub travel_count: usize,
    pub total_days: u32,
    pub total_photos: usize,
    pub country_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub name: String,
    pub country: Option<String>,
    pub year: Option<i32>,
    /// First page of the record's spread.
    pub page: usize,
}

/// Input of one generator call. Each generator accepts exactly one variant.
#[derive(Debug, Clone, Copy)]
pub enum PageData<'a> {
    Book {
        travels: &'a [TravelRecord],
        meta: &'a BookMeta,
    },
    Toc {
        entries: &'a [TocEntry],
    },
    Travel(&'a TravelRecord),
    Checklist(ChecklistSection),
}

#[derive(Debug, Clone, Copy)]
pub struct PageOptions<'a> {
    pub settings: &'a BookSettings,
    pub theme: &'a BookTheme,
    pub proxy: &'a ImageProxy,
}

#[async_trait(?Send)]
pub trait PageGenerator {
    /// Markup for the pages of this archetype, numbered from `page_number`.
    async fn generate(
        &self,
        data: &PageData<'_>,
        page_number: usize,
        options: &PageOptions<'_>,
    ) -> Result<String, PageError>;

    fn estimate_page_count(&self, data: &PageData<'_>, options: &PageOptions<'_>) -> usize;
}

/// Supplies pre-rendered map images for a route.
///
/// `None` means the provider has nothing for these points; the map page then
/// draws its own vector sketch.
#[async_trait(?Send)]
pub trait RoutePreviewProvider {
    async fn snapshot(&self, points: &[GeoPoint]) -> Option<String>;
}

/// Collaborators handed to the generators that need them.
#[derive(Clone, Default)]
pub struct GeneratorDeps {
    pub image_loader: Option<Arc<ImageLoader>>,
    pub route_preview: Option<Rc<dyn RoutePreviewProvider>>,
    pub block_renderer: Option<Rc<dyn BlockRenderer>>,
}

impl fmt::Debug for GeneratorDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorDeps")
            .field("image_loader", &self.image_loader.is_some())
            .field("route_preview", &self.route_preview.is_some())
            .field("block_renderer", &self.block_renderer.is_some())
            .finish()
    }
}

/// Creates generators on first request and hands out the cached instance
/// until [`clear_cache`](Self::clear_cache).
#[derive(Debug, Default)]
pub struct PageGeneratorFactory {
    deps: GeneratorDeps,
    cache: RefCell<HashMap<PageType, Rc<dyn PageGenerator>>>,
}

impl PageGeneratorFactory {
    pub fn new(deps: GeneratorDeps) -> Self {
        Self {
            deps,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn deps(&self) -> &GeneratorDeps {
        &self.deps
    }

    pub fn create(&self, page_type: PageType) -> Rc<dyn PageGenerator> {
        self.cache
            .borrow_mut()
            .entry(page_type)
            .or_insert_with(|| self.build(page_type))
            .clone()
    }

    pub fn create_by_name(&self, name: &str) -> Result<Rc<dyn PageGenerator>, PageError> {
        Ok(self.create(name.parse()?))
    }

    pub fn create_all(&self) -> BTreeMap<PageType, Rc<dyn PageGenerator>> {
        PageType::ALL.into_iter().map(|t| (t, self.create(t))).collect()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn available_types(&self) -> &'static [PageType] {
        &PageType::ALL
    }

    fn build(&self, page_type: PageType) -> Rc<dyn PageGenerator> {
        log::debug!("creating {page_type} page generator");
        match page_type {
            PageType::Cover => Rc::new(CoverPage::new(self.deps.image_loader.clone())),
            PageType::Toc => Rc::new(TocPage),
            PageType::Travel => Rc::new(TravelPage::new(self.deps.block_renderer.clone())),
            PageType::Gallery => Rc::new(GalleryPage::new(self.deps.image_loader.clone())),
            PageType::Map => Rc::new(MapPage::new(self.deps.route_preview.clone())),
            PageType::Checklist => Rc::new(ChecklistPage),
            PageType::Final => Rc::new(FinalPage),
        }
    }
}

impl fmt::Debug for dyn PageGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PageGenerator")
    }
}

// -----------------------------------------------------------------------------
// Shared page chrome
// -----------------------------------------------------------------------------

/// Book title shown in running headers.
pub(crate) fn book_title(settings: &BookSettings) -> &str {
    crate::types::non_blank(Some(settings.title.as_str()))
        .unwrap_or(crate::html::DEFAULT_DOCUMENT_TITLE)
}

pub(crate) fn running_header(left: &str, right: &str) -> Markup {
    html! {
        div.running-header {
            span { (left) }
            span { (right) }
        }
    }
}

pub(crate) fn page_number(n: usize) -> Markup {
    html! { div.page-number { (n) } }
}

/// Proxied URL of a photo, `None` for blank input.
pub(crate) fn photo_src(options: &PageOptions<'_>, raw: &str) -> Option<String> {
    options.proxy.rewrite(raw)
}
