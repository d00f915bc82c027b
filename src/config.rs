//! Book configuration module.
//!
//! Handles loading, validating, and merging `book.toml`. Stock defaults are the
//! base layer; a user file only needs the keys it wants to override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [book]
//! title = "Мои путешествия"
//! cover_type = "auto"         # auto | fixed | gradient
//! sort_order = "date-desc"    # date-asc | date-desc | country | alphabetical
//! include_toc = true
//! include_gallery = true
//! include_map = true
//! include_checklists = false
//! checklist_sections = ["documents", "medicine"]
//! image_quality = "high"      # low | medium | high
//! theme = "minimal"           # minimal | black-white | sepia
//! show_coordinates = true
//!
//! [book.gallery]
//! layout = "grid"             # grid | masonry | polaroid | collage | slideshow
//! spacing = "normal"          # compact | normal | spacious
//! show_captions = true
//! caption_position = "bottom" # top | bottom | overlay | none
//! border = "thin"             # none | thin | thick
//! photos_per_page = 6
//! collage_template = "hero-left" # hero-left | hero-right | hero-top | hero-bottom | symmetric | magazine
//!
//! [loader]
//! timeout_ms = 10000
//! max_retries = 3
//! batch_size = 5
//! retry_base_delay_ms = 500
//! inline_images = false
//!
//! [render]
//! margin = [10.0, 10.0, 14.0, 10.0]
//! image_type = "jpeg"
//! image_quality = 0.92
//! scale = 2.0
//! format = "a4"
//! orientation = "portrait"
//!
//! [history]
//! max_entries = 50
//! ttl_hours = 24
//! storage_dir = ".travelbook-history"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::render::RenderOptions;
use crate::theme::BookTheme;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything `book.toml` can hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookConfig {
    /// What goes into the book and how it looks.
    pub book: BookSettings,
    /// Remote image loading behaviour.
    pub loader: LoaderConfig,
    /// PDF render options handed to the renderer.
    pub render: RenderOptions,
    /// Undo/redo history for the document constructor.
    pub history: HistoryConfig,
}

impl BookConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.book.validate()?;
        self.loader.validate()?;
        self.history.validate()?;
        self.render
            .normalize()
            .map_err(|e| ConfigError::Validation(format!("render: {e}")))?;
        Ok(())
    }
}

/// Book-level settings supplied by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookSettings {
    /// Book title. A blank title falls back to a default and the cover
    /// shows no heading.
    pub title: String,
    pub subtitle: Option<String>,
    pub author_name: Option<String>,
    pub cover_type: CoverType,
    /// Required when `cover_type = "fixed"`.
    pub cover_image: Option<String>,
    pub sort_order: SortOrder,
    pub include_toc: bool,
    pub include_gallery: bool,
    pub include_map: bool,
    pub include_checklists: bool,
    /// Must be non-empty when `include_checklists` is on.
    pub checklist_sections: Vec<ChecklistSection>,
    pub gallery: GallerySettings,
    pub image_quality: ImageQuality,
    /// Named theme, see [`BookTheme::named`].
    pub theme: String,
    /// Print coordinates next to waypoints on map pages.
    pub show_coordinates: bool,
}

impl Default for BookSettings {
    fn default() -> Self {
        Self {
            title: "Мои путешествия".to_string(),
            subtitle: None,
            author_name: None,
            cover_type: CoverType::Auto,
            cover_image: None,
            sort_order: SortOrder::DateDesc,
            include_toc: true,
            include_gallery: true,
            include_map: true,
            include_checklists: false,
            checklist_sections: vec![ChecklistSection::Documents, ChecklistSection::Medicine],
            gallery: GallerySettings::default(),
            image_quality: ImageQuality::High,
            theme: "minimal".to_string(),
            show_coordinates: true,
        }
    }
}

impl BookSettings {
    /// Validate cross-field invariants. The orchestrator calls this before
    /// producing any page.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.include_checklists && self.checklist_sections.is_empty() {
            return Err(ConfigError::Validation(
                "book.checklist_sections must not be empty when include_checklists is on".into(),
            ));
        }
        if self.cover_type == CoverType::Fixed
            && self.cover_image.as_deref().is_none_or(|s| s.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "book.cover_image is required when cover_type is \"fixed\"".into(),
            ));
        }
        if let Some(columns) = self.gallery.columns {
            if !(1..=4).contains(&columns) {
                return Err(ConfigError::Validation(
                    "book.gallery.columns must be 1-4".into(),
                ));
            }
        }
        if self.gallery.photos_per_page == 0 {
            return Err(ConfigError::Validation(
                "book.gallery.photos_per_page must be at least 1".into(),
            ));
        }
        if BookTheme::named(&self.theme).is_none() {
            return Err(ConfigError::Validation(format!(
                "book.theme: unknown theme '{}' (expected one of: {})",
                self.theme,
                BookTheme::NAMES.join(", ")
            )));
        }
        Ok(())
    }

    /// Sections in configured order, one checklist page each. A section
    /// listed twice prints twice.
    pub fn effective_checklist_sections(&self) -> Vec<ChecklistSection> {
        if !self.include_checklists {
            return Vec::new();
        }
        self.checklist_sections.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoverType {
    /// First record photo that actually loads.
    #[default]
    Auto,
    Fixed,
    Gradient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    DateAsc,
    #[default]
    DateDesc,
    Country,
    Alphabetical,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::DateAsc => "date-asc",
            SortOrder::DateDesc => "date-desc",
            SortOrder::Country => "country",
            SortOrder::Alphabetical => "alphabetical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChecklistSection {
    Clothing,
    Food,
    Electronics,
    Documents,
    Medicine,
}

impl ChecklistSection {
    pub const ALL: [ChecklistSection; 5] = [
        ChecklistSection::Clothing,
        ChecklistSection::Food,
        ChecklistSection::Electronics,
        ChecklistSection::Documents,
        ChecklistSection::Medicine,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChecklistSection::Clothing => "Одежда",
            ChecklistSection::Food => "Еда",
            ChecklistSection::Electronics => "Электроника",
            ChecklistSection::Documents => "Документы",
            ChecklistSection::Medicine => "Аптечка",
        }
    }
}

/// Gallery page layout parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GallerySettings {
    pub layout: GalleryLayout,
    /// Column count 1-4. Absent means the layout picks one.
    pub columns: Option<u8>,
    pub spacing: Spacing,
    pub show_captions: bool,
    pub caption_position: CaptionPosition,
    pub border: BorderStyle,
    pub photos_per_page: usize,
    /// Collage arrangement for pages of five or more photos.
    pub collage_template: CollageTemplate,
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            layout: GalleryLayout::Grid,
            columns: None,
            spacing: Spacing::Normal,
            show_captions: true,
            caption_position: CaptionPosition::Bottom,
            border: BorderStyle::Thin,
            photos_per_page: 6,
            collage_template: CollageTemplate::HeroLeft,
        }
    }
}

impl GallerySettings {
    /// Configured columns, or the layout default, clamped to 1-4.
    pub fn effective_columns(&self) -> usize {
        let columns = match self.columns {
            Some(c) => c as usize,
            None => match self.layout {
                GalleryLayout::Grid | GalleryLayout::Masonry => 2,
                GalleryLayout::Polaroid | GalleryLayout::Collage => 3,
                GalleryLayout::Slideshow => 1,
            },
        };
        columns.clamp(1, 4)
    }

    /// Photos per gallery page. Slideshow shows one; a collage page never
    /// holds more than its arrangement has cells for.
    pub fn effective_photos_per_page(&self) -> usize {
        let per_page = self.photos_per_page.max(1);
        match self.layout {
            GalleryLayout::Slideshow => 1,
            GalleryLayout::Collage => self
                .collage_template
                .capacity()
                .map_or(per_page, |cells| per_page.min(cells)),
            _ => per_page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GalleryLayout {
    #[default]
    Grid,
    Masonry,
    Polaroid,
    Collage,
    Slideshow,
}

/// Collage arrangements.
///
/// Pages with fewer than five photos pick their arrangement by count (see
/// [`CollageTemplate::for_count`]); the configured one applies from five up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollageTemplate {
    /// Large photo on the left, the rest stacked on the right.
    #[default]
    HeroLeft,
    HeroRight,
    /// Large photo on top, the rest in one row below.
    HeroTop,
    HeroBottom,
    /// Two photos per row.
    Symmetric,
    /// Tall lead photo with four around it on a 2×3 grid.
    Magazine,
}

impl CollageTemplate {
    /// Photos one page of this arrangement holds. `None` for
    /// [`Symmetric`](Self::Symmetric), which grows a row per pair.
    pub fn capacity(self) -> Option<usize> {
        match self {
            CollageTemplate::Symmetric => None,
            _ => Some(5),
        }
    }

    /// Arrangement for a page of `count` photos.
    pub fn for_count(count: usize, preferred: CollageTemplate) -> CollageTemplate {
        match count {
            0 | 1 => CollageTemplate::HeroLeft,
            2 | 4 => CollageTemplate::Symmetric,
            3 => CollageTemplate::HeroTop,
            _ => preferred,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CollageTemplate::HeroLeft => "hero-left",
            CollageTemplate::HeroRight => "hero-right",
            CollageTemplate::HeroTop => "hero-top",
            CollageTemplate::HeroBottom => "hero-bottom",
            CollageTemplate::Symmetric => "symmetric",
            CollageTemplate::Magazine => "magazine",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Spacing {
    Compact,
    #[default]
    Normal,
    Spacious,
}

impl Spacing {
    /// Gap between photos in millimetres.
    pub fn gap_mm(self) -> u32 {
        match self {
            Spacing::Compact => 3,
            Spacing::Normal => 6,
            Spacing::Spacious => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptionPosition {
    Top,
    #[default]
    Bottom,
    Overlay,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BorderStyle {
    None,
    #[default]
    Thin,
    Thick,
}

/// Image quality tier, mapped to proxy width and JPEG quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageQuality {
    Low,
    Medium,
    #[default]
    High,
}

impl ImageQuality {
    /// `(width, quality)` requested from the image proxy.
    pub fn proxy_params(self) -> (u32, u8) {
        match self {
            ImageQuality::Low => (1000, 70),
            ImageQuality::Medium => (1600, 80),
            ImageQuality::High => (2400, 90),
        }
    }
}

/// Image loader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Per-attempt timeout (fetch + decode).
    pub timeout_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Concurrent loads per batch; batches run one after another.
    pub batch_size: usize,
    /// Base delay of the exponential backoff between attempts.
    pub retry_base_delay_ms: u64,
    /// Embed loaded images as `data:` URIs instead of keeping remote URLs.
    pub inline_images: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 3,
            batch_size: 5,
            retry_base_delay_ms: 500,
            inline_images: false,
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "loader.timeout_ms must be greater than 0".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Validation(
                "loader.batch_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Constructor history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    pub max_entries: usize,
    /// Persisted history older than this is discarded on load.
    pub ttl_hours: u32,
    pub storage_dir: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: 50,
            ttl_hours: 24,
            storage_dir: PathBuf::from(".travelbook-history"),
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::Validation(
                "history.max_entries must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BookConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BookConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BookConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `book.toml` from `path`, layered over stock defaults.
pub fn load_config(path: &Path) -> Result<BookConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `book.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Travelbook Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Book contents
# ---------------------------------------------------------------------------
[book]
# Title on the cover. Leave blank to print a cover without a heading.
title = "Мои путешествия"
# subtitle = "2019 - 2024"
# author_name = "Анна"

# Cover strategy: "auto" (first travel photo that loads), "fixed"
# (cover_image below) or "gradient" (no photo).
cover_type = "auto"
# cover_image = "https://example.com/cover.jpg"

# Travel order: "date-asc", "date-desc", "country" or "alphabetical".
sort_order = "date-desc"

include_toc = true
include_gallery = true
include_map = true

# Checklist pages, one per section. Sections: clothing, food,
# electronics, documents, medicine.
include_checklists = false
checklist_sections = ["documents", "medicine"]

# Image tier requested from the resize proxy: "low", "medium", "high".
image_quality = "high"

# Theme: "minimal", "black-white" or "sepia".
theme = "minimal"

# Print coordinates next to waypoints on map pages.
show_coordinates = true

# ---------------------------------------------------------------------------
# Gallery pages
# ---------------------------------------------------------------------------
[book.gallery]
# "grid", "masonry", "polaroid", "collage" or "slideshow".
layout = "grid"
# columns = 2            # 1-4; omit to let the layout decide
spacing = "normal"       # compact | normal | spacious
show_captions = true
caption_position = "bottom"  # top | bottom | overlay | none
border = "thin"          # none | thin | thick
photos_per_page = 6
# Collage arrangement for pages of 5+ photos; smaller pages pick by count.
# hero-left | hero-right | hero-top | hero-bottom | symmetric | magazine
collage_template = "hero-left"

# ---------------------------------------------------------------------------
# Image loading
# ---------------------------------------------------------------------------
[loader]
# Per-attempt timeout in milliseconds (fetch + decode).
timeout_ms = 10000
# Retries after the first failed attempt.
max_retries = 3
# Images loaded concurrently; batches run one after another.
batch_size = 5
# Backoff base: retry n waits base * 2^(n-1) milliseconds.
retry_base_delay_ms = 500
# Embed images in the HTML as data: URIs.
inline_images = false

# ---------------------------------------------------------------------------
# PDF rendering
# ---------------------------------------------------------------------------
[render]
# Page margins in mm: [top, right, bottom, left].
margin = [10.0, 10.0, 14.0, 10.0]
# Raster codec ("jpeg", "png", "webp") and quality 0-1.
image_type = "jpeg"
image_quality = 0.92
# Raster scale factor.
scale = 2.0
# Page format ("a3", "a4", "a5", "letter", "legal") and orientation.
format = "a4"
orientation = "portrait"

# ---------------------------------------------------------------------------
# Constructor history (undo/redo)
# ---------------------------------------------------------------------------
[history]
max_entries = 50
# Saved history older than this is discarded.
ttl_hours = 24
storage_dir = ".travelbook-history"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        BookConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[book]
sort_order = "date-asc"

[book.gallery]
layout = "masonry"
columns = 3
"##;
        let config: BookConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.book.sort_order, SortOrder::DateAsc);
        assert_eq!(config.book.gallery.layout, GalleryLayout::Masonry);
        assert_eq!(config.book.gallery.effective_columns(), 3);
        // Defaults preserved
        assert!(config.book.include_toc);
        assert_eq!(config.loader.max_retries, 3);
        assert_eq!(config.render.format, "a4");
    }

    #[test]
    fn checklists_require_sections() {
        let mut settings = BookSettings {
            include_checklists: true,
            checklist_sections: vec![],
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("checklist_sections")
        ));
        settings.checklist_sections = vec![ChecklistSection::Food];
        settings.validate().unwrap();
    }

    #[test]
    fn fixed_cover_requires_image() {
        let settings = BookSettings {
            cover_type: CoverType::Fixed,
            cover_image: Some("   ".into()),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn columns_out_of_range_rejected() {
        let mut settings = BookSettings::default();
        settings.gallery.columns = Some(5);
        assert!(settings.validate().is_err());
        settings.gallery.columns = Some(0);
        assert!(settings.validate().is_err());
        settings.gallery.columns = Some(4);
        settings.validate().unwrap();
    }

    #[test]
    fn unknown_theme_rejected() {
        let settings = BookSettings {
            theme: "neon".into(),
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("neon"));
    }

    #[test]
    fn effective_sections_keep_repeats_and_respect_toggle() {
        let mut settings = BookSettings {
            include_checklists: false,
            checklist_sections: vec![ChecklistSection::Food, ChecklistSection::Food],
            ..Default::default()
        };
        assert!(settings.effective_checklist_sections().is_empty());
        settings.include_checklists = true;
        assert_eq!(
            settings.effective_checklist_sections(),
            vec![ChecklistSection::Food, ChecklistSection::Food]
        );
    }

    #[test]
    fn slideshow_forces_one_photo_per_page() {
        let gallery = GallerySettings {
            layout: GalleryLayout::Slideshow,
            photos_per_page: 9,
            ..Default::default()
        };
        assert_eq!(gallery.effective_photos_per_page(), 1);
        assert_eq!(gallery.effective_columns(), 1);
    }

    #[test]
    fn collage_pages_fit_their_arrangement() {
        let mut gallery = GallerySettings {
            layout: GalleryLayout::Collage,
            photos_per_page: 9,
            ..Default::default()
        };
        assert_eq!(gallery.effective_photos_per_page(), 5);
        gallery.collage_template = CollageTemplate::HeroTop;
        assert_eq!(gallery.effective_photos_per_page(), 5);
        gallery.collage_template = CollageTemplate::Symmetric;
        assert_eq!(gallery.effective_photos_per_page(), 9);
        gallery.photos_per_page = 3;
        gallery.collage_template = CollageTemplate::Magazine;
        assert_eq!(gallery.effective_photos_per_page(), 3);
    }

    #[test]
    fn collage_arrangement_by_count() {
        let pick = |n| CollageTemplate::for_count(n, CollageTemplate::Magazine);
        assert_eq!(pick(1), CollageTemplate::HeroLeft);
        assert_eq!(pick(2), CollageTemplate::Symmetric);
        assert_eq!(pick(3), CollageTemplate::HeroTop);
        assert_eq!(pick(4), CollageTemplate::Symmetric);
        assert_eq!(pick(5), CollageTemplate::Magazine);
    }

    #[test]
    fn collage_template_from_toml() {
        let gallery: GallerySettings =
            toml::from_str("layout = \"collage\"\ncollage_template = \"hero-bottom\"").unwrap();
        assert_eq!(gallery.collage_template, CollageTemplate::HeroBottom);
        assert_eq!(gallery.collage_template.as_str(), "hero-bottom");
    }

    #[test]
    fn image_quality_tiers() {
        assert_eq!(ImageQuality::Low.proxy_params(), (1000, 70));
        assert_eq!(ImageQuality::Medium.proxy_params(), (1600, 80));
        assert_eq!(ImageQuality::High.proxy_params(), (2400, 90));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("book.toml")).unwrap();
        assert_eq!(config.book.title, "Мои путешествия");
        assert_eq!(config.loader.batch_size, 5);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("book.toml");
        fs::write(
            &path,
            r##"
[book]
title = "Балканы"
include_checklists = true
checklist_sections = ["clothing", "food"]

[loader]
batch_size = 2
"##,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.book.title, "Балканы");
        assert_eq!(
            config.book.checklist_sections,
            vec![ChecklistSection::Clothing, ChecklistSection::Food]
        );
        assert_eq!(config.loader.batch_size, 2);
        assert_eq!(config.loader.timeout_ms, 10_000);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("book.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("book.toml");
        fs::write(&path, "[render]\nformat = \"tabloid\"\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation(msg)) if msg.contains("tabloid")
        ));
    }

    #[test]
    fn unknown_key_rejected() {
        let toml = "[book]\ntitel = \"typo\"\n";
        let result: Result<BookConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let toml = "[printer]\nname = \"x\"\n";
        let result: Result<BookConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[book.gallery]\nborder = \"thick\"").unwrap();
        let merged = merge_toml(base, overlay);
        let config: BookConfig = merged.try_into().unwrap();
        assert_eq!(config.book.gallery.border, BorderStyle::Thick);
        assert_eq!(config.book.gallery.photos_per_page, 6);
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let overlay: toml::Value = toml::from_str("[loader]\nbatch_size = 0").unwrap();
        let result = resolve_config(stock_defaults_value(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // stock config tests
    // =========================================================================

    #[test]
    fn stock_config_toml_is_valid_toml() {
        let _: toml::Value =
            toml::from_str(stock_config_toml()).expect("stock config must be valid TOML");
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: BookConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = BookConfig::default();
        assert_eq!(config.book.title, defaults.book.title);
        assert_eq!(config.book.sort_order, defaults.book.sort_order);
        assert_eq!(config.book.checklist_sections, defaults.book.checklist_sections);
        assert_eq!(config.book.gallery.photos_per_page, 6);
        assert_eq!(config.loader.timeout_ms, defaults.loader.timeout_ms);
        assert_eq!(config.render.margin, defaults.render.margin);
        assert_eq!(config.history.max_entries, 50);
        config.validate().unwrap();
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        assert!(val.is_table());
        for section in ["book", "loader", "render", "history"] {
            assert!(val.get(section).is_some(), "missing [{section}]");
        }
    }
}
