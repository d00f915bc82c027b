//! Photo gallery pages.
//!
//! Photos are paginated by `photos_per_page` (one per page for slideshow).
//! Masonry layout needs height ratios; photos without recorded dimensions
//! are measured through the image loader when one is available, and count
//! as square otherwise.
//!
//! Collage pages place every photo in an explicit grid cell. The
//! arrangement follows the photo count on the page, see
//! [`CollageTemplate::for_count`].

use super::{
    PageData, PageError, PageGenerator, PageOptions, PageType, book_title, page_number,
    photo_src, running_header,
};
use crate::config::{CaptionPosition, CollageTemplate, GalleryLayout};
use crate::imaging::{ImageLoader, LoadedImage};
use crate::masonry::{CardStyle, distribute, photo_card};
use crate::plural::PHOTOS;
use crate::types::{GalleryPhoto, TravelRecord, non_blank};
use async_trait::async_trait;
use maud::{Markup, html};
use std::collections::HashMap;
use std::sync::Arc;

pub struct GalleryPage {
    loader: Option<Arc<ImageLoader>>,
}

/// A gallery photo ready to place.
struct Placed<'a> {
    index: usize,
    src: String,
    photo: &'a GalleryPhoto,
    ratio: f64,
}

fn layout_class(layout: GalleryLayout) -> &'static str {
    match layout {
        GalleryLayout::Grid => "layout-grid",
        GalleryLayout::Masonry => "layout-masonry",
        GalleryLayout::Polaroid => "layout-polaroid",
        GalleryLayout::Collage => "layout-collage",
        GalleryLayout::Slideshow => "layout-slideshow",
    }
}

fn usable_photos<'a>(
    record: &'a TravelRecord,
    options: &PageOptions<'_>,
) -> Vec<(String, &'a GalleryPhoto)> {
    record
        .gallery
        .iter()
        .filter_map(|p| photo_src(options, &p.url).map(|src| (src, p)))
        .collect()
}

/// Grid placement of one collage cell, in 1-based CSS grid lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CollageCell {
    row: usize,
    column: usize,
    row_span: usize,
    column_span: usize,
}

impl CollageCell {
    fn at(row: usize, column: usize) -> Self {
        Self {
            row,
            column,
            row_span: 1,
            column_span: 1,
        }
    }

    fn spanning(self, row_span: usize, column_span: usize) -> Self {
        Self {
            row_span: row_span.max(1),
            column_span: column_span.max(1),
            ..self
        }
    }

    fn grid_area(&self) -> String {
        format!(
            "grid-area: {} / {} / span {} / span {};",
            self.row, self.column, self.row_span, self.column_span
        )
    }
}

/// Track sizes and one cell per photo, in photo order.
#[derive(Debug, Clone, PartialEq)]
struct CollagePlan {
    template: CollageTemplate,
    columns: String,
    rows: String,
    cells: Vec<CollageCell>,
}

fn tracks(n: usize) -> String {
    format!("repeat({}, 1fr)", n.max(1))
}

/// Lead photo in a 2fr track, the rest along the 1fr track beside it.
const MAGAZINE_AREAS: [(usize, usize, usize); 5] = [
    // (row, column, row_span)
    (1, 1, 2),
    (1, 2, 1),
    (2, 2, 1),
    (3, 1, 1),
    (3, 2, 1),
];

fn collage_plan(count: usize, preferred: CollageTemplate) -> CollagePlan {
    let template = CollageTemplate::for_count(count, preferred);
    if count <= 1 {
        return CollagePlan {
            template,
            columns: tracks(1),
            rows: tracks(1),
            cells: (0..count).map(|_| CollageCell::at(1, 1)).collect(),
        };
    }
    let rest = count - 1;
    let (columns, rows, cells) = match template {
        CollageTemplate::HeroLeft | CollageTemplate::HeroRight => {
            let (hero_col, rest_col, columns) = if template == CollageTemplate::HeroLeft {
                (1, 2, "2fr 1fr")
            } else {
                (2, 1, "1fr 2fr")
            };
            let cells: Vec<CollageCell> = std::iter::once(CollageCell::at(1, hero_col).spanning(rest, 1))
                .chain((0..rest).map(|i| CollageCell::at(i + 1, rest_col)))
                .collect();
            (columns.to_string(), tracks(rest), cells)
        }
        CollageTemplate::HeroTop | CollageTemplate::HeroBottom => {
            let (hero_row, rest_row, rows) = if template == CollageTemplate::HeroTop {
                (1, 2, "2fr 1fr")
            } else {
                (2, 1, "1fr 2fr")
            };
            let cells: Vec<CollageCell> = std::iter::once(CollageCell::at(hero_row, 1).spanning(1, rest))
                .chain((0..rest).map(|i| CollageCell::at(rest_row, i + 1)))
                .collect();
            (tracks(rest), rows.to_string(), cells)
        }
        CollageTemplate::Symmetric => {
            let cells: Vec<CollageCell> = (0..count)
                .map(|i| CollageCell::at(i / 2 + 1, i % 2 + 1))
                .collect();
            (tracks(2), tracks(count.div_ceil(2)), cells)
        }
        CollageTemplate::Magazine => {
            // Photos past the fifth continue two per row below the grid.
            let extra_rows = count.saturating_sub(MAGAZINE_AREAS.len()).div_ceil(2);
            let cells: Vec<CollageCell> = (0..count)
                .map(|i| match MAGAZINE_AREAS.get(i) {
                    Some(&(row, column, span)) => CollageCell::at(row, column).spanning(span, 1),
                    None => {
                        let j = i - MAGAZINE_AREAS.len();
                        CollageCell::at(4 + j / 2, j % 2 + 1)
                    }
                })
                .collect();
            ("2fr 1fr".to_string(), tracks(3 + extra_rows), cells)
        }
    };
    CollagePlan {
        template,
        columns,
        rows,
        cells,
    }
}

impl GalleryPage {
    pub fn new(loader: Option<Arc<ImageLoader>>) -> Self {
        Self { loader }
    }

    async fn measure(&self, photos: &[(String, &GalleryPhoto)]) -> HashMap<String, LoadedImage> {
        let Some(loader) = &self.loader else {
            return HashMap::new();
        };
        let missing: Vec<&str> = photos
            .iter()
            .filter(|(_, p)| p.width.is_none() || p.height.is_none())
            .map(|(src, _)| src.as_str())
            .collect();
        if missing.is_empty() {
            return HashMap::new();
        }
        loader
            .load_images_batch(&missing, loader.options().batch_size, |_, _| {})
            .await
    }

    fn caption(&self, placed: &Placed<'_>, options: &PageOptions<'_>) -> Option<String> {
        options.settings.gallery.show_captions.then(|| {
            non_blank(placed.photo.caption.as_deref())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Фото {}", placed.index + 1))
        })
    }

    fn card(&self, placed: &Placed<'_>, record: &TravelRecord, options: &PageOptions<'_>) -> Markup {
        let gallery = &options.settings.gallery;
        let caption = self.caption(placed, options);
        let style = CardStyle {
            caption: if gallery.show_captions {
                gallery.caption_position
            } else {
                CaptionPosition::None
            },
            border: gallery.border,
        };
        let alt = format!("{} {}", record.name, placed.index + 1);
        photo_card(&placed.src, &alt, caption.as_deref(), style)
    }

    fn photos_block(
        &self,
        chunk: &[Placed<'_>],
        record: &TravelRecord,
        options: &PageOptions<'_>,
    ) -> Markup {
        let gallery = &options.settings.gallery;
        let gap = gallery.spacing.gap_mm();
        let columns = gallery.effective_columns();
        match gallery.layout {
            GalleryLayout::Masonry => {
                let stacks = distribute(chunk, columns, |p| p.ratio);
                html! {
                    div.gallery-masonry.layout-masonry style={ "gap: " (gap) "mm;" } {
                        @for stack in &stacks {
                            div.masonry-column style={ "gap: " (gap) "mm;" } {
                                @for placed in stack {
                                    (self.card(placed, record, options))
                                }
                            }
                        }
                    }
                }
            }
            GalleryLayout::Collage => self.collage_block(chunk, record, options),
            layout => html! {
                div class={ "gallery-grid " (layout_class(layout)) }
                    style={ "grid-template-columns: repeat(" (columns) ", 1fr); gap: " (gap) "mm;" } {
                    @for placed in chunk {
                        (self.card(placed, record, options))
                    }
                }
            },
        }
    }

    /// Cells have fixed sizes, so captions always sit over the photo.
    fn collage_block(
        &self,
        chunk: &[Placed<'_>],
        record: &TravelRecord,
        options: &PageOptions<'_>,
    ) -> Markup {
        let gallery = &options.settings.gallery;
        let plan = collage_plan(chunk.len(), gallery.collage_template);
        let show_caption = gallery.caption_position != CaptionPosition::None;
        html! {
            div class={ "gallery-collage layout-collage collage-" (plan.template.as_str()) }
                style={
                    "grid-template-columns: " (plan.columns) "; grid-template-rows: " (plan.rows)
                    "; gap: " (gallery.spacing.gap_mm()) "mm;"
                } {
                @for (placed, cell) in chunk.iter().zip(&plan.cells) {
                    figure.collage-cell style=(cell.grid_area()) {
                        img src=(placed.src) alt={ (record.name) " " (placed.index + 1) } loading="eager";
                        @if let Some(text) = self.caption(placed, options).filter(|_| show_caption) {
                            figcaption.photo-caption.caption-overlay { (text) }
                        }
                    }
                }
            }
        }
    }
}

#[async_trait(?Send)]
impl PageGenerator for GalleryPage {
    async fn generate(
        &self,
        data: &PageData<'_>,
        page_number_start: usize,
        options: &PageOptions<'_>,
    ) -> Result<String, PageError> {
        let PageData::Travel(record) = data else {
            return Err(PageError::MissingData {
                page: PageType::Gallery,
            });
        };
        let photos = usable_photos(record, options);
        if photos.is_empty() {
            return Ok(String::new());
        }

        let measured = if options.settings.gallery.layout == GalleryLayout::Masonry {
            self.measure(&photos).await
        } else {
            HashMap::new()
        };
        let placed: Vec<Placed<'_>> = photos
            .into_iter()
            .enumerate()
            .map(|(index, (src, photo))| {
                let ratio = match (photo.width, photo.height) {
                    (Some(_), Some(_)) => photo.height_ratio(),
                    _ => measured.get(&src).map_or(1.0, LoadedImage::height_ratio),
                };
                Placed {
                    index,
                    src,
                    photo,
                    ratio,
                }
            })
            .collect();

        let per_page = options.settings.gallery.effective_photos_per_page();
        let pages = placed.len().div_ceil(per_page);
        let title = book_title(options.settings);
        let mut out = String::new();
        for (i, chunk) in placed.chunks(per_page).enumerate() {
            let markup = html! {
                section.pdf-page.gallery-page {
                    (running_header(title, &record.name))
                    @if i == 0 {
                        h2 { "Фотогалерея" }
                        p.gallery-subtitle { (record.name) }
                    }
                    (self.photos_block(chunk, record, options))
                    div.gallery-footer {
                        (PHOTOS.count(placed.len() as u64))
                        @if pages > 1 {
                            " · " (i + 1) " / " (pages)
                        }
                    }
                    (page_number(page_number_start + i))
                }
            };
            out.push_str(&markup.into_string());
        }
        Ok(out)
    }

    fn estimate_page_count(&self, data: &PageData<'_>, options: &PageOptions<'_>) -> usize {
        match data {
            PageData::Travel(record) => usable_photos(record, options)
                .len()
                .div_ceil(options.settings.gallery.effective_photos_per_page()),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BookSettings, BorderStyle, GallerySettings};
    use crate::imaging::loader::tests::{MockFetcher, Script, fast_options};
    use crate::test_helpers::*;

    fn env(gallery: GallerySettings) -> PageEnv {
        PageEnv::new(BookSettings {
            gallery,
            ..Default::default()
        })
    }

    fn record_with(n: usize) -> TravelRecord {
        let mut r = record("g", "Галерея", Some(2020));
        r.gallery = (0..n)
            .map(|i| GalleryPhoto::new(format!("https://cdn.test/{i}.jpg")))
            .collect();
        r
    }

    #[tokio::test]
    async fn empty_gallery_emits_nothing() {
        let env = PageEnv::default();
        let r = record_with(0);
        let generator = GalleryPage::new(None);
        let data = PageData::Travel(&r);
        assert_eq!(generator.generate(&data, 4, &env.options()).await.unwrap(), "");
        assert_eq!(generator.estimate_page_count(&data, &env.options()), 0);
    }

    #[tokio::test]
    async fn paginates_by_photos_per_page() {
        let env = env(GallerySettings {
            photos_per_page: 4,
            ..Default::default()
        });
        let r = record_with(9);
        let generator = GalleryPage::new(None);
        let data = PageData::Travel(&r);
        let html = generator.generate(&data, 4, &env.options()).await.unwrap();
        assert_eq!(generator.estimate_page_count(&data, &env.options()), 3);
        assert_eq!(count_pages(&html), 3);
        assert_eq!(page_numbers(&html), vec![4, 5, 6]);
        assert_eq!(html.matches("<figure").count(), 9);
        assert!(html.contains("9 фотографий · 1 / 3"));
    }

    #[tokio::test]
    async fn slideshow_is_one_photo_per_page() {
        let env = env(GallerySettings {
            layout: GalleryLayout::Slideshow,
            ..Default::default()
        });
        let r = record_with(3);
        let html = GalleryPage::new(None)
            .generate(&PageData::Travel(&r), 1, &env.options())
            .await
            .unwrap();
        assert_eq!(count_pages(&html), 3);
        assert!(html.contains("layout-slideshow"));
    }

    #[tokio::test]
    async fn captions_prefer_photo_caption_and_respect_toggle() {
        let mut r = record_with(2);
        r.gallery[0].caption = Some("Закат".into());
        let shown = env(GallerySettings::default());
        let html = GalleryPage::new(None)
            .generate(&PageData::Travel(&r), 1, &shown.options())
            .await
            .unwrap();
        assert!(html.contains(">Закат</figcaption>"));
        assert!(html.contains(">Фото 2</figcaption>"));

        let hidden = env(GallerySettings {
            show_captions: false,
            border: BorderStyle::Thick,
            ..Default::default()
        });
        let html = GalleryPage::new(None)
            .generate(&PageData::Travel(&r), 1, &hidden.options())
            .await
            .unwrap();
        assert!(!html.contains("figcaption"));
        assert!(html.contains("border-thick"));
    }

    #[tokio::test]
    async fn masonry_measures_unknown_dimensions() {
        let env = env(GallerySettings {
            layout: GalleryLayout::Masonry,
            columns: Some(2),
            photos_per_page: 10,
            show_captions: false,
            ..Default::default()
        });
        let mut r = record_with(4);
        // Photo 0 is tall and known; photo 1 is measured as wide.
        r.gallery[0] = r.gallery[0].clone().with_dimensions(100, 300);
        let wide = env.proxy.rewrite(&r.gallery[1].url).unwrap();
        let fetcher = Arc::new(MockFetcher::new().with(&wide, Script::Ok(png_bytes(40, 10))));
        let loader = Arc::new(ImageLoader::new(fetcher.clone(), fast_options()));

        let html = GalleryPage::new(Some(loader))
            .generate(&PageData::Travel(&r), 1, &env.options())
            .await
            .unwrap();
        assert_eq!(html.matches("masonry-column").count(), 2);
        // Column 0 holds only the tall photo; the others stack in column 1.
        let second = html.rfind("masonry-column").unwrap();
        assert!(html[..second].contains("/0.jpg") || html[..second].contains("%2F0.jpg"));
        assert_eq!(html[second..].matches("<figure").count(), 3);
        assert_eq!(fetcher.calls_for(&wide), 1);
    }

    fn cells(plan: &CollagePlan) -> Vec<(usize, usize, usize, usize)> {
        plan.cells
            .iter()
            .map(|c| (c.row, c.column, c.row_span, c.column_span))
            .collect()
    }

    #[test]
    fn collage_single_photo_fills_the_page() {
        let plan = collage_plan(1, CollageTemplate::Magazine);
        assert_eq!(plan.template, CollageTemplate::HeroLeft);
        assert_eq!(cells(&plan), vec![(1, 1, 1, 1)]);
    }

    #[test]
    fn collage_two_and_four_photos_are_symmetric() {
        let plan = collage_plan(2, CollageTemplate::HeroLeft);
        assert_eq!(plan.template, CollageTemplate::Symmetric);
        assert_eq!(plan.columns, "repeat(2, 1fr)");
        assert_eq!(plan.rows, "repeat(1, 1fr)");
        assert_eq!(cells(&plan), vec![(1, 1, 1, 1), (1, 2, 1, 1)]);

        let plan = collage_plan(4, CollageTemplate::HeroLeft);
        assert_eq!(plan.template, CollageTemplate::Symmetric);
        assert_eq!(plan.rows, "repeat(2, 1fr)");
        assert_eq!(
            cells(&plan),
            vec![(1, 1, 1, 1), (1, 2, 1, 1), (2, 1, 1, 1), (2, 2, 1, 1)]
        );
    }

    #[test]
    fn collage_three_photos_put_the_hero_on_top() {
        let plan = collage_plan(3, CollageTemplate::HeroLeft);
        assert_eq!(plan.template, CollageTemplate::HeroTop);
        assert_eq!(plan.columns, "repeat(2, 1fr)");
        assert_eq!(plan.rows, "2fr 1fr");
        assert_eq!(cells(&plan), vec![(1, 1, 1, 2), (2, 1, 1, 1), (2, 2, 1, 1)]);
    }

    #[test]
    fn collage_five_photos_use_the_configured_arrangement() {
        let left = collage_plan(5, CollageTemplate::HeroLeft);
        assert_eq!(left.columns, "2fr 1fr");
        assert_eq!(left.rows, "repeat(4, 1fr)");
        assert_eq!(
            cells(&left),
            vec![(1, 1, 4, 1), (1, 2, 1, 1), (2, 2, 1, 1), (3, 2, 1, 1), (4, 2, 1, 1)]
        );

        let right = collage_plan(5, CollageTemplate::HeroRight);
        assert_eq!(right.columns, "1fr 2fr");
        assert_eq!(right.cells[0], CollageCell::at(1, 2).spanning(4, 1));
        assert!(right.cells[1..].iter().all(|c| c.column == 1));

        let bottom = collage_plan(5, CollageTemplate::HeroBottom);
        assert_eq!(bottom.rows, "1fr 2fr");
        assert_eq!(bottom.cells[0], CollageCell::at(2, 1).spanning(1, 4));
        assert!(bottom.cells[1..].iter().all(|c| c.row == 1));

        let magazine = collage_plan(5, CollageTemplate::Magazine);
        assert_eq!(magazine.rows, "repeat(3, 1fr)");
        assert_eq!(
            cells(&magazine),
            vec![(1, 1, 2, 1), (1, 2, 1, 1), (2, 2, 1, 1), (3, 1, 1, 1), (3, 2, 1, 1)]
        );
    }

    #[test]
    fn collage_gives_every_photo_a_cell() {
        for template in [
            CollageTemplate::HeroLeft,
            CollageTemplate::HeroRight,
            CollageTemplate::HeroTop,
            CollageTemplate::HeroBottom,
            CollageTemplate::Symmetric,
            CollageTemplate::Magazine,
        ] {
            for n in 0..10 {
                assert_eq!(collage_plan(n, template).cells.len(), n, "{template:?} {n}");
            }
        }
        let long = collage_plan(8, CollageTemplate::Magazine);
        assert_eq!(long.rows, "repeat(5, 1fr)");
        assert_eq!(long.cells[7], CollageCell::at(5, 1));
    }

    #[tokio::test]
    async fn collage_pages_render_explicit_cells() {
        let env = env(GallerySettings {
            layout: GalleryLayout::Collage,
            photos_per_page: 8,
            ..Default::default()
        });
        let mut r = record_with(8);
        r.gallery[0].caption = Some("Вид сверху".into());
        let generator = GalleryPage::new(None);
        let data = PageData::Travel(&r);
        let html = generator.generate(&data, 1, &env.options()).await.unwrap();

        // Five on the first page, three on the second.
        assert_eq!(generator.estimate_page_count(&data, &env.options()), 2);
        assert_eq!(count_pages(&html), 2);
        assert_eq!(html.matches(r#"<figure class="collage-cell""#).count(), 8);
        assert!(html.contains("collage-hero-left"));
        assert!(html.contains("collage-hero-top"));
        assert!(html.contains(r#"style="grid-area: 1 / 1 / span 4 / span 1;""#));
        assert!(html.contains("grid-template-columns: 2fr 1fr; grid-template-rows: repeat(4, 1fr); gap: 6mm;"));
        assert!(html.contains(r#"<figcaption class="photo-caption caption-overlay">Вид сверху</figcaption>"#));
    }

    #[tokio::test]
    async fn layout_columns_and_gap_in_style() {
        let env = env(GallerySettings {
            layout: GalleryLayout::Polaroid,
            spacing: crate::config::Spacing::Compact,
            ..Default::default()
        });
        let r = record_with(2);
        let html = GalleryPage::new(None)
            .generate(&PageData::Travel(&r), 1, &env.options())
            .await
            .unwrap();
        assert!(html.contains("layout-polaroid"));
        assert!(html.contains("repeat(3, 1fr); gap: 3mm;"));
    }
}
