//! Route page: a map of the waypoints plus the list of stops.
//!
//! The picture comes from the [`RoutePreviewProvider`] when it has a
//! snapshot for the route. Otherwise the page draws a vector sketch of the
//! numbered stops, or an "insufficient data" frame when no waypoint has
//! coordinates.

use super::{
    PageData, PageError, PageGenerator, PageOptions, PageType, RoutePreviewProvider, book_title,
    page_number, running_header,
};
use crate::plural::PLACES;
use crate::theme::BookTheme;
use crate::types::{GeoPoint, TravelRecord, Waypoint};
use async_trait::async_trait;
use maud::{Markup, html};
use reqwest::Url;
use std::rc::Rc;

pub const INSUFFICIENT_DATA: &str = "Недостаточно данных";

const VIEW_W: f64 = 100.0;
const VIEW_H: f64 = 60.0;
const PAD_X: f64 = 6.0;
const PAD_Y: f64 = 8.0;

pub struct MapPage {
    preview: Option<Rc<dyn RoutePreviewProvider>>,
}

/// Project points into the sketch viewBox, north up.
pub fn project(points: &[GeoPoint]) -> Vec<(f64, f64)> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let (mut min_lat, mut max_lat, mut min_lng, mut max_lng) =
        (first.lat, first.lat, first.lng, first.lng);
    for p in points {
        min_lat = min_lat.min(p.lat);
        max_lat = max_lat.max(p.lat);
        min_lng = min_lng.min(p.lng);
        max_lng = max_lng.max(p.lng);
    }
    let lat_range = (max_lat - min_lat).max(0.0001);
    let lng_range = (max_lng - min_lng).max(0.0001);
    let width = VIEW_W - PAD_X * 2.0;
    let height = VIEW_H - PAD_Y * 2.0;
    points
        .iter()
        .map(|p| {
            (
                PAD_X + (p.lng - min_lng) / lng_range * width,
                PAD_Y + (max_lat - p.lat) / lat_range * height,
            )
        })
        .collect()
}

fn route_sketch(points: &[GeoPoint], theme: &BookTheme) -> Markup {
    let projected = project(points);
    let polyline: Vec<String> = projected
        .iter()
        .map(|(x, y)| format!("{x:.2},{y:.2}"))
        .collect();
    let c = &theme.colors;
    html! {
        svg.route-sketch xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 60"
            role="img" aria-label="Маршрут путешествия" {
            rect x="0" y="0" width="100" height="60" rx="4" fill=(c.surface) {}
            @if projected.len() >= 2 {
                polyline points=(polyline.join(" ")) fill="none" stroke=(c.accent)
                    stroke-width="1.2" stroke-dasharray="4,3" stroke-linecap="round"
                    stroke-linejoin="round" opacity="0.6" {}
            }
            @for (i, (x, y)) in projected.iter().enumerate() {
                g {
                    circle cx=(format!("{x:.2}")) cy=(format!("{y:.2}")) r="2.6"
                        fill=(c.background) stroke=(c.accent) stroke-width="0.7" {}
                    text x=(format!("{x:.2}")) y=(format!("{:.2}", y + 1.1)) font-size="3.4"
                        text-anchor="middle" fill=(c.text) font-weight="700" { (i + 1) }
                }
            }
        }
    }
}

fn insufficient_data(theme: &BookTheme) -> Markup {
    html! {
        svg.route-sketch.route-placeholder xmlns="http://www.w3.org/2000/svg"
            viewBox="0 0 100 60" role="img" aria-label="Маршрут" {
            rect x="0" y="0" width="100" height="60" rx="4" fill=(theme.colors.surface) {}
            text x="50" y="32" text-anchor="middle" fill=(theme.colors.text_muted) font-size="8" {
                (INSUFFICIENT_DATA)
            }
        }
    }
}

/// Search link for a stop: coordinates when known, the address otherwise.
pub fn maps_link(waypoint: &Waypoint) -> Option<String> {
    let query = match waypoint.point() {
        Some(p) => format!("{},{}", p.lat, p.lng),
        None if !waypoint.address.trim().is_empty() => waypoint.address.trim().to_string(),
        None => return None,
    };
    let mut url = Url::parse("https://www.google.com/maps/search/").ok()?;
    url.query_pairs_mut()
        .append_pair("api", "1")
        .append_pair("query", &query);
    Some(url.into())
}

impl MapPage {
    pub fn new(preview: Option<Rc<dyn RoutePreviewProvider>>) -> Self {
        Self { preview }
    }

    async fn picture(&self, record: &TravelRecord, theme: &BookTheme) -> Markup {
        let points: Vec<GeoPoint> = record
            .located_waypoints()
            .into_iter()
            .map(|(_, _, p)| p)
            .collect();
        if points.is_empty() {
            return insufficient_data(theme);
        }
        if let Some(provider) = &self.preview {
            if let Some(src) = provider.snapshot(&points).await {
                return html! {
                    img.route-snapshot src=(src) alt={ "Маршрут: " (record.name) };
                };
            }
            log::debug!("no route snapshot for '{}', drawing sketch", record.name);
        }
        route_sketch(&points, theme)
    }
}

#[async_trait(?Send)]
impl PageGenerator for MapPage {
    async fn generate(
        &self,
        data: &PageData<'_>,
        page_number_value: usize,
        options: &PageOptions<'_>,
    ) -> Result<String, PageError> {
        let PageData::Travel(record) = data else {
            return Err(PageError::MissingData { page: PageType::Map });
        };
        if record.waypoints.is_empty() {
            return Ok(String::new());
        }
        let picture = self.picture(record, options.theme).await;
        let show_coordinates = options.settings.show_coordinates;
        let markup = html! {
            section.pdf-page.map-page {
                (running_header(book_title(options.settings), &record.name))
                h2 { "Маршрут" }
                p.map-summary { (PLACES.count(record.waypoints.len() as u64)) }
                (picture)
                ol.waypoint-list {
                    @for (i, waypoint) in record.waypoints.iter().enumerate() {
                        li.waypoint {
                            span.waypoint-index { (i + 1) }
                            div {
                                strong {
                                    @if waypoint.address.trim().is_empty() {
                                        "Точка " (i + 1)
                                    } @else {
                                        (waypoint.address.trim())
                                    }
                                }
                                @if let Some(category) = &waypoint.category {
                                    " · " (category)
                                }
                                @if show_coordinates {
                                    @if let Some(p) = waypoint.point() {
                                        div.waypoint-coord { (format!("{:.5}, {:.5}", p.lat, p.lng)) }
                                    }
                                }
                                @if let Some(link) = maps_link(waypoint) {
                                    div { a.waypoint-link href=(link) { "Открыть на карте" } }
                                }
                            }
                        }
                    }
                }
                (page_number(page_number_value))
            }
        };
        Ok(markup.into_string())
    }

    fn estimate_page_count(&self, data: &PageData<'_>, _options: &PageOptions<'_>) -> usize {
        match data {
            PageData::Travel(record) if !record.waypoints.is_empty() => 1,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BookSettings;
    use crate::test_helpers::*;
    use std::cell::RefCell;

    struct FixedPreview {
        answer: Option<String>,
        asked: RefCell<Vec<usize>>,
    }

    #[async_trait(?Send)]
    impl RoutePreviewProvider for FixedPreview {
        async fn snapshot(&self, points: &[GeoPoint]) -> Option<String> {
            self.asked.borrow_mut().push(points.len());
            self.answer.clone()
        }
    }

    async fn render(record: &TravelRecord, page: &MapPage, env: &PageEnv) -> String {
        page.generate(&PageData::Travel(record), 9, &env.options())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn sketch_numbers_every_located_stop() {
        let env = PageEnv::default();
        let records = sample_records();
        let html = render(&records[0], &MapPage::new(None), &env).await;
        assert!(html.contains("<polyline"));
        assert_eq!(html.matches("<circle").count(), 2);
        assert!(html.contains("2 места"));
        assert!(html.contains("41.71510, 44.82710"));
        assert!(html.contains("https://www.google.com/maps/search/?api=1&amp;query=41.7151%2C44.8271"));
        assert_eq!(page_numbers(&html), vec![9]);
    }

    #[tokio::test]
    async fn no_coordinates_shows_insufficient_data() {
        let env = PageEnv::default();
        let mut r = record("x", "Без координат", None);
        r.waypoints = vec![waypoint("Где-то", None)];
        let html = render(&r, &MapPage::new(None), &env).await;
        assert!(html.contains(INSUFFICIENT_DATA));
        assert!(!html.contains("<circle"));
        assert!(html.contains("query=%D0%93%D0%B4%D0%B5-%D1%82%D0%BE"));
    }

    #[tokio::test]
    async fn no_waypoints_no_page() {
        let env = PageEnv::default();
        let r = record("x", "Пусто", None);
        let page = MapPage::new(None);
        assert_eq!(render(&r, &page, &env).await, "");
        assert_eq!(page.estimate_page_count(&PageData::Travel(&r), &env.options()), 0);
    }

    #[tokio::test]
    async fn provider_snapshot_wins_over_sketch() {
        let env = PageEnv::default();
        let records = sample_records();
        let provider = Rc::new(FixedPreview {
            answer: Some("data:image/png;base64,AAAA".into()),
            asked: RefCell::new(Vec::new()),
        });
        let html = render(&records[0], &MapPage::new(Some(provider.clone())), &env).await;
        assert!(html.contains(r#"<img class="route-snapshot" src="data:image/png;base64,AAAA""#));
        assert!(!html.contains("<polyline"));
        assert_eq!(*provider.asked.borrow(), vec![2]);
    }

    #[tokio::test]
    async fn provider_without_snapshot_falls_back() {
        let env = PageEnv::default();
        let records = sample_records();
        let provider = Rc::new(FixedPreview {
            answer: None,
            asked: RefCell::new(Vec::new()),
        });
        let html = render(&records[1], &MapPage::new(Some(provider)), &env).await;
        assert!(html.contains("route-sketch"));
        assert_eq!(html.matches("<circle").count(), 1);
        assert!(!html.contains("<polyline"));
    }

    #[tokio::test]
    async fn coordinates_can_be_hidden() {
        let env = PageEnv::new(BookSettings {
            show_coordinates: false,
            ..Default::default()
        });
        let records = sample_records();
        let html = render(&records[0], &MapPage::new(None), &env).await;
        assert!(!html.contains("waypoint-coord"));
    }

    #[test]
    fn projection_is_north_up_within_padding() {
        let pts = [
            GeoPoint { lat: 10.0, lng: 0.0 },
            GeoPoint { lat: 0.0, lng: 10.0 },
        ];
        let projected = project(&pts);
        assert_eq!(projected[0], (PAD_X, PAD_Y));
        assert_eq!(projected[1], (VIEW_W - PAD_X, VIEW_H - PAD_Y));
    }
}
