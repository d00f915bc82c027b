//! Shared test utilities for the travelbook test suite.
//!
//! Provides record builders, a tiny in-memory PNG encoder and page-markup
//! helpers that the generator and loader tests share.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let records = sample_records();
//! let env = PageEnv::new(BookSettings::default());
//! let html = generator.generate(&PageData::Travel(&records[0]), 3, &env.options()).await?;
//! assert_eq!(count_pages(&html), 2);
//! ```

use crate::config::BookSettings;
use crate::imaging::ImageProxy;
use crate::pages::PageOptions;
use crate::theme::BookTheme;
use crate::types::{GalleryPhoto, TravelRecord, Waypoint};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

// =========================================================================
// Images
// =========================================================================

/// Encode a black `width`×`height` PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

// =========================================================================
// Records
// =========================================================================

pub fn record(id: &str, name: &str, year: Option<i32>) -> TravelRecord {
    TravelRecord {
        id: id.to_string(),
        name: name.to_string(),
        year,
        ..Default::default()
    }
}

pub fn waypoint(address: &str, coord: Option<&str>) -> Waypoint {
    Waypoint {
        address: address.to_string(),
        coord: coord.map(str::to_string),
        category: None,
    }
}

pub fn gallery(urls: &[&str]) -> Vec<GalleryPhoto> {
    urls.iter().map(|u| GalleryPhoto::new(*u)).collect()
}

/// Three fully populated records, deliberately out of year order.
pub fn sample_records() -> Vec<TravelRecord> {
    vec![
        TravelRecord {
            country: Some("Грузия".into()),
            cover_image: Some("https://cdn.test/tbilisi.jpg".into()),
            gallery: gallery(&["https://cdn.test/g1.jpg", "https://cdn.test/g2.jpg"]),
            waypoints: vec![
                waypoint("Тбилиси", Some("41.7151,44.8271")),
                waypoint("Казбеги", Some("42.6566,44.6420")),
            ],
            description: Some("<p>Горы и <b>хинкали</b>.</p>".into()),
            highlights: Some("- Вино\n- Люди".into()),
            days: Some(7),
            ..record("ge", "Кавказ", Some(2022))
        },
        TravelRecord {
            country: Some("Италия".into()),
            cover_image: Some("https://cdn.test/rome.jpg".into()),
            gallery: gallery(&["https://cdn.test/r1.jpg"]),
            waypoints: vec![waypoint("Рим", Some("41.9028,12.4964"))],
            description: Some("Вечный город.".into()),
            days: Some(5),
            ..record("it", "Рим", Some(2019))
        },
        TravelRecord {
            country: Some("Беларусь".into()),
            description: Some("<h2>День 1</h2><p>Озёра.</p>".into()),
            drawbacks: Some("Комары".into()),
            days: Some(1),
            ..record("by", "Браславские озёра", Some(2021))
        },
    ]
}

// =========================================================================
// Page rendering
// =========================================================================

/// Owns everything [`PageOptions`] borrows.
pub struct PageEnv {
    pub settings: BookSettings,
    pub theme: BookTheme,
    pub proxy: ImageProxy,
}

impl PageEnv {
    pub fn new(settings: BookSettings) -> Self {
        let proxy = ImageProxy::new(settings.image_quality);
        Self {
            settings,
            theme: BookTheme::minimal(),
            proxy,
        }
    }

    pub fn options(&self) -> PageOptions<'_> {
        PageOptions {
            settings: &self.settings,
            theme: &self.theme,
            proxy: &self.proxy,
        }
    }
}

impl Default for PageEnv {
    fn default() -> Self {
        Self::new(BookSettings::default())
    }
}

/// Number of `<section class="pdf-page …">` elements.
pub fn count_pages(html: &str) -> usize {
    html.matches(r#"<section class="pdf-page"#).count()
}

/// Numbers printed in page footers, in document order.
pub fn page_numbers(html: &str) -> Vec<usize> {
    let marker = r#"<div class="page-number">"#;
    html.match_indices(marker)
        .filter_map(|(i, _)| {
            let rest = &html[i + marker.len()..];
            rest[..rest.find('<')?].parse().ok()
        })
        .collect()
}
