//! Column-balanced photo layout.
//!
//! [`distribute`] is a greedy packer: each item goes to the column with the
//! smallest accumulated height so far (first such column on ties), and that
//! column grows by the item's height ratio. It is a heuristic. Caption height
//! and gaps are not modelled, so long runs can drift by a few rows.
//!
//! [`photo_card`] is the card template shared by every gallery layout.

use crate::config::{BorderStyle, CaptionPosition};
use maud::{Markup, html};

/// Spread `items` over at most `column_count` columns.
///
/// A column count of 0 is treated as 1, and no empty columns are produced:
/// the result has `min(column_count, items.len())` columns. Item order within
/// a column follows input order.
pub fn distribute<'a, T>(
    items: &'a [T],
    column_count: usize,
    ratio: impl Fn(&T) -> f64,
) -> Vec<Vec<&'a T>> {
    let columns = column_count.max(1).min(items.len());
    let mut out: Vec<Vec<&T>> = (0..columns).map(|_| Vec::new()).collect();
    let mut heights = vec![0.0_f64; columns];

    for item in items {
        let mut target = 0;
        for (i, h) in heights.iter().enumerate() {
            if *h < heights[target] {
                target = i;
            }
        }
        let r = ratio(item);
        heights[target] += if r.is_finite() && r > 0.0 { r } else { 1.0 };
        out[target].push(item);
    }
    out
}

/// How a card frames its photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardStyle {
    pub caption: CaptionPosition,
    pub border: BorderStyle,
}

/// One photo with an optional caption. `caption` is ignored when the style
/// says [`CaptionPosition::None`].
pub fn photo_card(src: &str, alt: &str, caption: Option<&str>, style: CardStyle) -> Markup {
    let border = match style.border {
        BorderStyle::None => "border-none",
        BorderStyle::Thin => "border-thin",
        BorderStyle::Thick => "border-thick",
    };
    let caption = caption
        .map(str::trim)
        .filter(|c| !c.is_empty() && style.caption != CaptionPosition::None);
    html! {
        figure class={ "photo-card " (border) } {
            @if let (Some(text), CaptionPosition::Top) = (caption, style.caption) {
                figcaption.photo-caption.caption-top { (text) }
            }
            img src=(src) alt=(alt) loading="eager";
            @if let Some(text) = caption {
                @match style.caption {
                    CaptionPosition::Bottom => { figcaption.photo-caption.caption-bottom { (text) } }
                    CaptionPosition::Overlay => { figcaption.photo-caption.caption-overlay { (text) } }
                    _ => {}
                }
            }
        }
    }
}
