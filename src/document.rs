//! Constructor model: a book as pages of absolutely positioned blocks.
//!
//! This is the editable representation used when a book is arranged by hand
//! instead of generated from records. A [`PdfDocument`] owns its pages and a
//! page owns its blocks; every block carries an explicit position and size
//! in page-relative units, there is no implicit flow. The model is plain
//! serde data so that [`crate::history`] can snapshot and persist it.

use crate::blocks::{Block, parse_content};
use crate::render::{Orientation, PageFormat};
use crate::theme::BookTheme;
use crate::types::TravelRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    HeadingH1,
    HeadingH2,
    HeadingH3,
    Paragraph,
    Image,
    ImageGallery,
    Map,
    TipBlock,
    ImportantBlock,
    WarningBlock,
    Quote,
    Checklist,
    Table,
    Divider,
    Spacer,
    CoverPage,
    TocPage,
    AuthorBlock,
    RecommendationsBlock,
}

impl BlockKind {
    pub const ALL: [BlockKind; 19] = [
        BlockKind::HeadingH1,
        BlockKind::HeadingH2,
        BlockKind::HeadingH3,
        BlockKind::Paragraph,
        BlockKind::Image,
        BlockKind::ImageGallery,
        BlockKind::Map,
        BlockKind::TipBlock,
        BlockKind::ImportantBlock,
        BlockKind::WarningBlock,
        BlockKind::Quote,
        BlockKind::Checklist,
        BlockKind::Table,
        BlockKind::Divider,
        BlockKind::Spacer,
        BlockKind::CoverPage,
        BlockKind::TocPage,
        BlockKind::AuthorBlock,
        BlockKind::RecommendationsBlock,
    ];

    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => BlockKind::HeadingH1,
            2 => BlockKind::HeadingH2,
            _ => BlockKind::HeadingH3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Mm,
    Percent,
}

/// Top-left corner and size of a block on its page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockPosition {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
}

impl BlockPosition {
    pub fn mm(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: Unit::Mm,
        }
    }

    /// The same rectangle in millimetres on a page of `page` size.
    pub fn to_mm(self, page: (f64, f64)) -> Self {
        match self.unit {
            Unit::Mm => self,
            Unit::Percent => Self {
                x: self.x / 100.0 * page.0,
                y: self.y / 100.0 * page.1,
                width: self.width / 100.0 * page.0,
                height: self.height / 100.0 * page.1,
                unit: Unit::Mm,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockStyle {
    pub font_size: Option<f64>,
    pub font_weight: Option<String>,
    pub text_align: Option<String>,
    pub color: Option<String>,
    pub background_color: Option<String>,
    pub border_radius: Option<f64>,
    pub padding: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    Cover,
    Contain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BlockContent {
    Empty,
    Text {
        text: String,
    },
    Image {
        url: String,
        alt: String,
        fit: ImageFit,
    },
    Gallery {
        urls: Vec<String>,
    },
    Items {
        items: Vec<String>,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

impl BlockContent {
    pub fn text(text: impl Into<String>) -> Self {
        BlockContent::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub position: BlockPosition,
    #[serde(default)]
    pub style: BlockStyle,
    pub content: BlockContent,
    #[serde(default)]
    pub z_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfPage {
    pub id: String,
    pub format: PageFormat,
    pub orientation: Orientation,
    pub background: Option<String>,
    pub blocks: Vec<PdfBlock>,
}

impl PdfPage {
    pub fn size_mm(&self) -> (f64, f64) {
        let (w, h) = self.format.size_mm();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    pub fn block(&self, id: &str) -> Option<&PdfBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn block_mut(&mut self, id: &str) -> Option<&mut PdfBlock> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    /// Blocks sticking out of the page, by id.
    pub fn overflowing_blocks(&self) -> Vec<&str> {
        let (w, h) = self.size_mm();
        self.blocks
            .iter()
            .filter(|b| {
                let p = b.position.to_mm((w, h));
                p.x < 0.0 || p.y < 0.0 || p.x + p.width > w + 1e-6 || p.y + p.height > h + 1e-6
            })
            .map(|b| b.id.as_str())
            .collect()
    }

    /// Raise a block above every other block on the page.
    pub fn bring_to_front(&mut self, id: &str) -> bool {
        let top = self.blocks.iter().map(|b| b.z_index).max().unwrap_or(0);
        match self.block_mut(id) {
            Some(block) => {
                block.z_index = top + 1;
                true
            }
            None => false,
        }
    }

    /// Blocks in paint order.
    pub fn painted(&self) -> Vec<&PdfBlock> {
        let mut blocks: Vec<&PdfBlock> = self.blocks.iter().collect();
        blocks.sort_by_key(|b| b.z_index);
        blocks
    }
}

/// Theme of a constructed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfTheme {
    pub name: String,
    pub text_color: String,
    pub muted_color: String,
    pub accent_color: String,
    pub background_color: String,
    pub heading_font: String,
    pub body_font: String,
    /// Heading sizes h1..h3, points.
    pub heading_sizes: [f64; 3],
    pub body_size: f64,
    pub line_height: f64,
    pub page_margin_mm: f64,
    pub block_gap_mm: f64,
}

impl From<&BookTheme> for PdfTheme {
    fn from(theme: &BookTheme) -> Self {
        let body = f64::from(theme.typography.base_size_pt);
        Self {
            name: theme.name.clone(),
            text_color: theme.colors.text.clone(),
            muted_color: theme.colors.text_muted.clone(),
            accent_color: theme.colors.accent.clone(),
            background_color: theme.colors.background.clone(),
            heading_font: theme.typography.heading_font.clone(),
            body_font: theme.typography.body_font.clone(),
            heading_sizes: [body * 2.4, body * 1.7, body * 1.3],
            body_size: body,
            line_height: f64::from(theme.typography.line_height),
            page_margin_mm: f64::from(theme.spacing.page_padding_mm),
            block_gap_mm: f64::from(theme.spacing.block_gap_mm),
        }
    }
}

impl Default for PdfTheme {
    fn default() -> Self {
        Self::from(&BookTheme::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfDocument {
    pub id: String,
    pub title: String,
    pub pages: Vec<PdfPage>,
    pub theme: PdfTheme,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Source of page and block ids.
    #[serde(default)]
    next_id: u64,
}

impl PdfDocument {
    pub fn new(id: impl Into<String>, title: impl Into<String>, theme: PdfTheme) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            pages: Vec::new(),
            theme,
            created_at: now,
            updated_at: now,
            next_id: 0,
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Append an empty page and return its id.
    pub fn add_page(&mut self, format: PageFormat, orientation: Orientation) -> String {
        let id = self.next_id("page");
        self.pages.push(PdfPage {
            id: id.clone(),
            format,
            orientation,
            background: None,
            blocks: Vec::new(),
        });
        self.touch();
        id
    }

    pub fn page(&self, id: &str) -> Option<&PdfPage> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn page_mut(&mut self, id: &str) -> Option<&mut PdfPage> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    pub fn remove_page(&mut self, id: &str) -> Option<PdfPage> {
        let index = self.pages.iter().position(|p| p.id == id)?;
        self.touch();
        Some(self.pages.remove(index))
    }

    /// Move a page to `to`, clamped to the end.
    pub fn move_page(&mut self, id: &str, to: usize) -> bool {
        let Some(from) = self.pages.iter().position(|p| p.id == id) else {
            return false;
        };
        let page = self.pages.remove(from);
        let to = to.min(self.pages.len());
        self.pages.insert(to, page);
        self.touch();
        true
    }

    /// Add a block to a page; `None` when the page does not exist.
    pub fn add_block(
        &mut self,
        page_id: &str,
        kind: BlockKind,
        position: BlockPosition,
        style: BlockStyle,
        content: BlockContent,
    ) -> Option<String> {
        let page_index = self.pages.iter().position(|p| p.id == page_id)?;
        let id = self.next_id("block");
        let z_index = self.pages[page_index].blocks.len() as i32;
        self.pages[page_index].blocks.push(PdfBlock {
            id: id.clone(),
            kind,
            position,
            style,
            content,
            z_index,
        });
        self.touch();
        Some(id)
    }

    pub fn remove_block(&mut self, block_id: &str) -> Option<PdfBlock> {
        for page in &mut self.pages {
            if let Some(index) = page.blocks.iter().position(|b| b.id == block_id) {
                let block = page.blocks.remove(index);
                self.touch();
                return Some(block);
            }
        }
        None
    }

    pub fn block_count(&self) -> usize {
        self.pages.iter().map(|p| p.blocks.len()).sum()
    }

    /// Lay a travel record out as a cover page followed by content pages.
    pub fn from_travel(record: &TravelRecord, theme: PdfTheme) -> Self {
        let mut doc = PdfDocument::new(format!("travel-{}", record.id), &record.name, theme);
        Importer::new(&mut doc).import(record);
        doc
    }
}

/// Flows record content top to bottom, starting a new page when the current
/// one is full.
struct Importer<'a> {
    doc: &'a mut PdfDocument,
    page: String,
    y: f64,
}

const FORMAT: PageFormat = PageFormat::A4;

impl<'a> Importer<'a> {
    fn new(doc: &'a mut PdfDocument) -> Self {
        Self {
            doc,
            page: String::new(),
            y: 0.0,
        }
    }

    fn size(&self) -> (f64, f64) {
        FORMAT.size_mm()
    }

    fn margin(&self) -> f64 {
        self.doc.theme.page_margin_mm.max(10.0)
    }

    fn content_width(&self) -> f64 {
        self.size().0 - self.margin() * 2.0
    }

    fn new_page(&mut self) {
        self.page = self.doc.add_page(FORMAT, Orientation::Portrait);
        self.y = self.margin();
    }

    fn place(&mut self, kind: BlockKind, height: f64, style: BlockStyle, content: BlockContent) {
        let bottom = self.size().1 - self.margin();
        if self.page.is_empty() || (self.y + height > bottom && self.y > self.margin()) {
            self.new_page();
        }
        let height = height.min(bottom - self.y);
        let position = BlockPosition::mm(self.margin(), self.y, self.content_width(), height);
        let page = self.page.clone();
        self.doc.add_block(&page, kind, position, style, content);
        self.y += height + self.doc.theme.block_gap_mm;
    }

    /// Rough text height: average glyph width is half the font size.
    fn text_height(&self, text: &str, size_pt: f64) -> f64 {
        let glyph_mm = size_pt * 0.3528 * 0.5;
        let per_line = (self.content_width() / glyph_mm).max(1.0);
        let lines = (text.chars().count() as f64 / per_line).ceil().max(1.0);
        lines * size_pt * 0.3528 * self.doc.theme.line_height
    }

    fn cover(&mut self, record: &TravelRecord) {
        self.new_page();
        let (w, h) = self.size();
        let page = self.page.clone();
        let theme = self.doc.theme.clone();
        if let Some(photo) = record.primary_photo() {
            self.doc.add_block(
                &page,
                BlockKind::Image,
                BlockPosition::mm(0.0, 0.0, w, h),
                BlockStyle::default(),
                BlockContent::Image {
                    url: photo.to_string(),
                    alt: record.name.clone(),
                    fit: ImageFit::Cover,
                },
            );
        }
        self.doc.add_block(
            &page,
            BlockKind::HeadingH1,
            BlockPosition::mm(20.0, h / 2.0 - 60.0, w - 40.0, 50.0),
            BlockStyle {
                font_size: Some(theme.heading_sizes[0] * 1.5),
                font_weight: Some("bold".into()),
                text_align: Some("center".into()),
                color: Some(theme.text_color.clone()),
                ..Default::default()
            },
            BlockContent::text(&record.name),
        );
        let subtitle: Vec<String> = record
            .country_label()
            .map(str::to_string)
            .into_iter()
            .chain(record.year.map(|y| y.to_string()))
            .collect();
        if !subtitle.is_empty() {
            self.doc.add_block(
                &page,
                BlockKind::Paragraph,
                BlockPosition::mm(20.0, h / 2.0, w - 40.0, 30.0),
                BlockStyle {
                    font_size: Some(theme.body_size * 1.2),
                    text_align: Some("center".into()),
                    color: Some(theme.muted_color.clone()),
                    ..Default::default()
                },
                BlockContent::text(subtitle.join(" · ")),
            );
        }
        if let Some(author) = crate::types::non_blank(record.author.as_deref()) {
            self.doc.add_block(
                &page,
                BlockKind::AuthorBlock,
                BlockPosition::mm(20.0, h - 60.0, w - 40.0, 20.0),
                BlockStyle {
                    text_align: Some("center".into()),
                    color: Some(theme.muted_color.clone()),
                    ..Default::default()
                },
                BlockContent::text(author),
            );
        }
        // Content always starts on a fresh page.
        self.page.clear();
    }

    fn section(&mut self, title: &str, raw: Option<&str>, callout: Option<BlockKind>) {
        let Some(raw) = crate::types::non_blank(raw) else {
            return;
        };
        let theme = self.doc.theme.clone();
        self.place(
            BlockKind::HeadingH2,
            theme.heading_sizes[1] * 0.3528 * 1.8,
            BlockStyle {
                font_size: Some(theme.heading_sizes[1]),
                font_weight: Some("bold".into()),
                color: Some(theme.text_color.clone()),
                ..Default::default()
            },
            BlockContent::text(title),
        );
        for block in parse_content(raw).blocks() {
            match block {
                Block::Heading { level, text } => {
                    let size = theme.heading_sizes[usize::from(level.clamp(1, 3)) - 1];
                    let height = self.text_height(&text, size);
                    self.place(
                        BlockKind::heading(level),
                        height,
                        BlockStyle {
                            font_size: Some(size),
                            font_weight: Some("bold".into()),
                            ..Default::default()
                        },
                        BlockContent::text(text),
                    );
                }
                Block::Paragraph { text } => {
                    let height = self.text_height(&text, theme.body_size);
                    let kind = callout.unwrap_or(BlockKind::Paragraph);
                    self.place(kind, height, BlockStyle::default(), BlockContent::text(text));
                }
                Block::List { items, .. } => {
                    let height = items
                        .iter()
                        .map(|i| self.text_height(i, theme.body_size))
                        .sum::<f64>();
                    self.place(
                        BlockKind::Checklist,
                        height,
                        BlockStyle::default(),
                        BlockContent::Items { items },
                    );
                }
                Block::Quote { text, author } => {
                    let text = match author {
                        Some(author) => format!("{text}\n{author}"),
                        None => text,
                    };
                    let height = self.text_height(&text, theme.body_size) + 10.0;
                    self.place(BlockKind::Quote, height, BlockStyle::default(), BlockContent::text(text));
                }
                Block::Image { src, alt, .. } => {
                    self.place(
                        BlockKind::Image,
                        90.0,
                        BlockStyle::default(),
                        BlockContent::Image {
                            url: src,
                            alt,
                            fit: ImageFit::Contain,
                        },
                    );
                }
            }
        }
    }

    fn import(&mut self, record: &TravelRecord) {
        self.cover(record);
        self.section("Описание", record.description.as_deref(), None);
        self.section("Плюсы", record.highlights.as_deref(), Some(BlockKind::TipBlock));
        self.section("Минусы", record.drawbacks.as_deref(), Some(BlockKind::WarningBlock));
        if let Some(raw) = crate::types::non_blank(record.recommendations.as_deref()) {
            let items: Vec<String> = parse_content(raw)
                .blocks()
                .flat_map(|b| match b {
                    Block::List { items, .. } => items,
                    Block::Paragraph { text } | Block::Heading { text, .. } => vec![text],
                    Block::Quote { text, .. } => vec![text],
                    Block::Image { .. } => Vec::new(),
                })
                .collect();
            let height = 20.0 + items.len() as f64 * 8.0;
            self.place(
                BlockKind::RecommendationsBlock,
                height,
                BlockStyle::default(),
                BlockContent::Items { items },
            );
        }
        let gallery: Vec<String> = record
            .gallery
            .iter()
            .map(|p| p.url.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if !gallery.is_empty() {
            self.place(
                BlockKind::ImageGallery,
                120.0,
                BlockStyle::default(),
                BlockContent::Gallery { urls: gallery },
            );
        }
        if !record.located_waypoints().is_empty() {
            self.place(BlockKind::Map, 100.0, BlockStyle::default(), BlockContent::Empty);
        }
    }
}
