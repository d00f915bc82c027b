//! Input data model: travel records as supplied by the caller.
//!
//! Records are read from JSON and stay immutable for the whole generation run.
//! Deserialization is lenient where real exports are messy: `year` may arrive as
//! a number or a string, gallery entries may be bare URLs or objects, and
//! waypoint coordinates are `"lat,lng"` strings.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use thiserror::Error;

/// One travel as exported by the app.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelRecord {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    #[serde(deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    pub cover_image: Option<String>,
    pub gallery: Vec<GalleryPhoto>,
    pub waypoints: Vec<Waypoint>,
    /// Rich text (HTML or Markdown).
    pub description: Option<String>,
    pub highlights: Option<String>,
    pub drawbacks: Option<String>,
    pub recommendations: Option<String>,
    pub days: Option<u32>,
    pub author: Option<String>,
    pub url: Option<String>,
}

impl TravelRecord {
    /// Year used for ordering; records without a year sort as 0.
    pub fn sort_year(&self) -> i32 {
        self.year.unwrap_or(0)
    }

    /// Cover image, falling back to the first gallery photo.
    pub fn primary_photo(&self) -> Option<&str> {
        non_blank(self.cover_image.as_deref())
            .or_else(|| self.gallery.iter().map(|p| p.url.as_str()).find(|u| !u.trim().is_empty()))
    }

    pub fn country_label(&self) -> Option<&str> {
        non_blank(self.country.as_deref())
    }

    /// Waypoints that carry parseable coordinates.
    pub fn located_waypoints(&self) -> Vec<(usize, &Waypoint, GeoPoint)> {
        self.waypoints
            .iter()
            .enumerate()
            .filter_map(|(i, w)| w.point().map(|p| (i, w, p)))
            .collect()
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawYear {
        Number(i64),
        Text(String),
    }

    let raw = Option::<RawYear>::deserialize(deserializer)?;
    let year = match raw {
        Some(RawYear::Number(n)) => i32::try_from(n).ok(),
        Some(RawYear::Text(s)) => s.trim().parse::<i32>().ok(),
        None => None,
    };
    Ok(year.filter(|y| *y > 0))
}

/// A gallery photo. Dimensions are optional; the gallery page asks the image
/// loader when they are missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPhoto")]
pub struct GalleryPhoto {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub caption: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPhoto {
    Url(String),
    Full {
        url: String,
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        caption: Option<String>,
    },
}

impl From<RawPhoto> for GalleryPhoto {
    fn from(raw: RawPhoto) -> Self {
        match raw {
            RawPhoto::Url(url) => GalleryPhoto {
                url,
                ..Default::default()
            },
            RawPhoto::Full {
                url,
                width,
                height,
                caption,
            } => GalleryPhoto {
                url,
                width,
                height,
                caption,
            },
        }
    }
}

impl GalleryPhoto {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Height per unit of width, the masonry height proxy. 1.0 when unknown.
    pub fn height_ratio(&self) -> f64 {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => h as f64 / w as f64,
            _ => 1.0,
        }
    }
}

/// A named stop on the route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Waypoint {
    pub address: String,
    /// `"lat,lng"` as stored by the app.
    pub coord: Option<String>,
    pub category: Option<String>,
}

impl Waypoint {
    pub fn point(&self) -> Option<GeoPoint> {
        self.coord.as_deref().and_then(GeoPoint::parse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Parse `"lat,lng"`. Out-of-range or non-finite values are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let (lat, lng) = raw.split_once(',')?;
        let lat: f64 = lat.trim().parse().ok()?;
        let lng: f64 = lng.trim().parse().ok()?;
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(GeoPoint { lat, lng })
    }
}

#[derive(Error, Debug)]
pub enum RecordsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid travel records: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse records from a JSON array, or an object with a `travels` array.
pub fn parse_records(json: &str) -> Result<Vec<TravelRecord>, RecordsError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRecords {
        List(Vec<TravelRecord>),
        Wrapped { travels: Vec<TravelRecord> },
    }

    Ok(match serde_json::from_str(json)? {
        RawRecords::List(records) | RawRecords::Wrapped { travels: records } => records,
    })
}

pub fn load_records(path: &Path) -> Result<Vec<TravelRecord>, RecordsError> {
    parse_records(&std::fs::read_to_string(path)?)
}
