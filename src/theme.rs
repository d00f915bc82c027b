//! Book themes and the base stylesheet.
//!
//! A [`BookTheme`] is plain data (colors, typography, spacing, block styling)
//! handed to every page generator. Generators only use it for layout-driving
//! values; the bulk of the look lives in the CSS returned by
//! [`BookTheme::base_css`], which the orchestrator installs once per document.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookTheme {
    pub name: String,
    pub colors: ThemeColors,
    pub typography: Typography,
    pub spacing: ThemeSpacing,
    pub blocks: BlockStyles,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub text: String,
    pub text_muted: String,
    pub heading: String,
    pub background: String,
    pub surface: String,
    pub accent: String,
    pub border: String,
    /// Two stops for gradient covers.
    pub cover_gradient: [String; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    pub heading_font: String,
    pub body_font: String,
    pub base_size_pt: f32,
    pub line_height: f32,
}

/// Page and block spacing, millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSpacing {
    pub page_padding_mm: f32,
    pub section_gap_mm: f32,
    pub block_gap_mm: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStyles {
    pub border_radius_px: u32,
    pub quote_border: String,
    pub quote_background: String,
    pub image_shadow: bool,
}

impl Default for BookTheme {
    fn default() -> Self {
        Self::minimal()
    }
}

fn s(v: &str) -> String {
    v.to_string()
}

impl BookTheme {
    pub const NAMES: [&'static str; 3] = ["minimal", "black-white", "sepia"];

    /// Look up a theme by its configuration name.
    pub fn named(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "minimal" => Some(Self::minimal()),
            "black-white" => Some(Self::black_white()),
            "sepia" => Some(Self::sepia()),
            _ => None,
        }
    }

    pub fn minimal() -> Self {
        Self {
            name: s("minimal"),
            colors: ThemeColors {
                text: s("#1f2937"),
                text_muted: s("#6b7280"),
                heading: s("#111827"),
                background: s("#ffffff"),
                surface: s("#f9fafb"),
                accent: s("#ff9f5a"),
                border: s("#e5e7eb"),
                cover_gradient: [s("#ff9f5a"), s("#ff6b6b")],
            },
            typography: Typography {
                heading_font: s("'Playfair Display', Georgia, serif"),
                body_font: s("'Inter', 'Helvetica Neue', Arial, sans-serif"),
                base_size_pt: 11.0,
                line_height: 1.6,
            },
            spacing: ThemeSpacing {
                page_padding_mm: 18.0,
                section_gap_mm: 8.0,
                block_gap_mm: 4.0,
            },
            blocks: BlockStyles {
                border_radius_px: 8,
                quote_border: s("#ff9f5a"),
                quote_background: s("#fff7ed"),
                image_shadow: true,
            },
        }
    }

    pub fn black_white() -> Self {
        Self {
            name: s("black-white"),
            colors: ThemeColors {
                text: s("#000000"),
                text_muted: s("#4b4b4b"),
                heading: s("#000000"),
                background: s("#ffffff"),
                surface: s("#f2f2f2"),
                accent: s("#000000"),
                border: s("#000000"),
                cover_gradient: [s("#1a1a1a"), s("#4d4d4d")],
            },
            typography: Typography {
                heading_font: s("Georgia, 'Times New Roman', serif"),
                body_font: s("Georgia, 'Times New Roman', serif"),
                base_size_pt: 11.0,
                line_height: 1.5,
            },
            spacing: ThemeSpacing {
                page_padding_mm: 16.0,
                section_gap_mm: 7.0,
                block_gap_mm: 3.5,
            },
            blocks: BlockStyles {
                border_radius_px: 0,
                quote_border: s("#000000"),
                quote_background: s("#ffffff"),
                image_shadow: false,
            },
        }
    }

    pub fn sepia() -> Self {
        Self {
            name: s("sepia"),
            colors: ThemeColors {
                text: s("#3e2723"),
                text_muted: s("#795548"),
                heading: s("#3e2723"),
                background: s("#f5f1e8"),
                surface: s("#efe6d5"),
                accent: s("#8d6e63"),
                border: s("#d7ccc8"),
                cover_gradient: [s("#8d6e63"), s("#5d4037")],
            },
            typography: Typography {
                heading_font: s("'Lora', Georgia, serif"),
                body_font: s("'Lora', Georgia, serif"),
                base_size_pt: 11.5,
                line_height: 1.65,
            },
            spacing: ThemeSpacing {
                page_padding_mm: 20.0,
                section_gap_mm: 9.0,
                block_gap_mm: 4.5,
            },
            blocks: BlockStyles {
                border_radius_px: 4,
                quote_border: s("#8d6e63"),
                quote_background: s("#efe6d5"),
                image_shadow: false,
            },
        }
    }

    pub fn cover_gradient_css(&self) -> String {
        format!(
            "linear-gradient(135deg, {} 0%, {} 100%)",
            self.colors.cover_gradient[0], self.colors.cover_gradient[1]
        )
    }

    /// Stylesheet shared by every page of the book.
    pub fn base_css(&self) -> String {
        let c = &self.colors;
        let t = &self.typography;
        let sp = &self.spacing;
        let b = &self.blocks;
        let shadow = if b.image_shadow {
            "0 2px 8px rgba(0,0,0,0.12)"
        } else {
            "none"
        };
        format!(
            r#":root {{
    --color-text: {text};
    --color-muted: {muted};
    --color-heading: {heading};
    --color-bg: {bg};
    --color-surface: {surface};
    --color-accent: {accent};
    --color-border: {border};
    --font-heading: {heading_font};
    --font-body: {body_font};
    --page-padding: {pad}mm;
    --section-gap: {section_gap}mm;
    --block-gap: {block_gap}mm;
    --radius: {radius}px;
    --image-shadow: {shadow};
}}
* {{ box-sizing: border-box; }}
html, body {{ margin: 0; padding: 0; background: var(--color-bg); }}
body {{ font-family: var(--font-body); font-size: {size}pt; line-height: {lh}; color: var(--color-text); }}
h1, h2, h3, h4, h5, h6 {{ font-family: var(--font-heading); color: var(--color-heading); margin: 0 0 var(--block-gap); }}
img {{ max-width: 100%; display: block; }}
.pdf-page {{ width: 210mm; min-height: 297mm; padding: var(--page-padding); position: relative; overflow: hidden; page-break-after: always; break-after: page; background: var(--color-bg); }}
.pdf-page:last-child {{ page-break-after: auto; break-after: auto; }}
.running-header {{ display: flex; justify-content: space-between; font-size: 8pt; color: var(--color-muted); border-bottom: 1px solid var(--color-border); padding-bottom: 2mm; margin-bottom: var(--section-gap); text-transform: uppercase; letter-spacing: 0.08em; }}
.page-number {{ position: absolute; bottom: 8mm; left: 0; right: 0; text-align: center; font-size: 9pt; color: var(--color-muted); }}
.cover-page {{ padding: 0; display: flex; color: #ffffff; }}
.cover-bg {{ position: absolute; inset: 0; width: 100%; height: 100%; object-fit: cover; }}
.cover-shade {{ position: absolute; inset: 0; background: linear-gradient(180deg, rgba(0,0,0,0.05) 40%, rgba(0,0,0,0.65) 100%); }}
.cover-content {{ position: relative; margin-top: auto; padding: 24mm 20mm; width: 100%; }}
.cover-title {{ font-size: 40pt; line-height: 1.1; color: #ffffff; margin-bottom: 6mm; }}
.cover-subtitle {{ font-size: 16pt; opacity: 0.9; margin: 0 0 8mm; }}
.cover-stats {{ display: flex; gap: 8mm; font-size: 12pt; }}
.cover-author {{ margin-top: 8mm; font-size: 11pt; opacity: 0.85; }}
.toc-list {{ list-style: none; margin: 0; padding: 0; }}
.toc-item {{ display: flex; align-items: baseline; gap: 3mm; padding: 2.5mm 0; border-bottom: 1px dashed var(--color-border); }}
.toc-name {{ font-weight: 600; }}
.toc-meta {{ color: var(--color-muted); font-size: 9pt; }}
.toc-dots {{ flex: 1; }}
.toc-number {{ font-variant-numeric: tabular-nums; color: var(--color-accent); font-weight: 600; }}
.travel-photo-page {{ padding: 0; }}
.travel-hero {{ position: absolute; inset: 0; }}
.travel-hero-img {{ width: 100%; height: 100%; object-fit: cover; }}
.travel-hero-placeholder {{ width: 100%; height: 100%; background: var(--color-surface); }}
.travel-hero-caption {{ position: absolute; left: 0; right: 0; bottom: 0; padding: 18mm 16mm; color: #ffffff; background: linear-gradient(180deg, transparent, rgba(0,0,0,0.7)); }}
.travel-hero-caption h1 {{ color: #ffffff; font-size: 30pt; }}
.travel-meta {{ display: flex; flex-wrap: wrap; gap: 3mm; }}
.meta-chip {{ padding: 1.5mm 3.5mm; border-radius: 999px; background: rgba(255,255,255,0.18); font-size: 10pt; }}
.travel-section {{ margin-bottom: var(--section-gap); }}
.section-title {{ font-size: 14pt; color: var(--color-accent); }}
.block-paragraph {{ margin: 0 0 var(--block-gap); text-align: justify; }}
.block-list {{ margin: 0 0 var(--block-gap); padding-left: 6mm; }}
.block-quote {{ margin: 0 0 var(--block-gap); padding: 3mm 5mm; border-left: 3px solid {quote_border}; background: {quote_bg}; border-radius: var(--radius); font-style: italic; }}
.block-quote cite {{ display: block; margin-top: 2mm; font-size: 9pt; color: var(--color-muted); font-style: normal; }}
.block-image {{ margin: 0 0 var(--block-gap); }}
.block-image img {{ border-radius: var(--radius); box-shadow: var(--image-shadow); }}
.block-image figcaption {{ font-size: 9pt; color: var(--color-muted); margin-top: 1.5mm; text-align: center; }}
.inline-gallery {{ display: grid; gap: 3mm; margin-top: var(--section-gap); }}
.inline-gallery-1 {{ grid-template-columns: 1fr; }}
.inline-gallery-2 {{ grid-template-columns: repeat(2, 1fr); }}
.inline-gallery-3, .inline-gallery-4 {{ grid-template-columns: repeat(2, 1fr); }}
.inline-gallery-item {{ position: relative; aspect-ratio: 4 / 3; overflow: hidden; border-radius: var(--radius); }}
.inline-gallery-item img {{ width: 100%; height: 100%; object-fit: cover; }}
.inline-gallery-more {{ position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; background: rgba(0,0,0,0.5); color: #ffffff; font-size: 18pt; font-weight: 700; }}
.gallery-grid {{ display: grid; }}
.gallery-masonry {{ display: flex; align-items: flex-start; }}
.masonry-column {{ flex: 1; display: flex; flex-direction: column; }}
.photo-card {{ position: relative; break-inside: avoid; background: var(--color-bg); }}
.photo-card img {{ width: 100%; height: auto; border-radius: var(--radius); }}
.photo-card.border-thin {{ border: 1px solid var(--color-border); padding: 1.5mm; }}
.photo-card.border-thick {{ border: 3px solid var(--color-text); padding: 2.5mm; }}
.photo-caption {{ font-size: 8.5pt; color: var(--color-muted); padding: 1.5mm 0; }}
.photo-caption.caption-overlay {{ position: absolute; left: 0; right: 0; bottom: 0; padding: 2mm 3mm; color: #ffffff; background: linear-gradient(180deg, transparent, rgba(0,0,0,0.65)); }}
.layout-polaroid .photo-card {{ background: #ffffff; padding: 3mm 3mm 9mm; box-shadow: 0 3px 10px rgba(0,0,0,0.18); }}
.layout-polaroid .photo-card:nth-child(odd) {{ transform: rotate(-2deg); }}
.layout-polaroid .photo-card:nth-child(even) {{ transform: rotate(1.5deg); }}
.gallery-collage {{ display: grid; height: 200mm; }}
.collage-cell {{ position: relative; margin: 0; overflow: hidden; border-radius: var(--radius); box-shadow: var(--image-shadow); }}
.collage-cell img {{ width: 100%; height: 100%; object-fit: cover; }}
.layout-slideshow .photo-card img {{ max-height: 220mm; object-fit: contain; }}
.gallery-footer {{ margin-top: var(--section-gap); color: var(--color-muted); font-size: 9pt; text-align: right; }}
.route-sketch {{ width: 100%; height: auto; background: var(--color-surface); border-radius: var(--radius); }}
.route-snapshot {{ width: 100%; border-radius: var(--radius); }}
.route-placeholder {{ display: flex; align-items: center; justify-content: center; }}
.waypoint-list {{ list-style: none; margin: var(--section-gap) 0 0; padding: 0; }}
.waypoint {{ display: flex; gap: 3mm; padding: 2mm 0; border-bottom: 1px solid var(--color-border); }}
.waypoint-index {{ flex: 0 0 7mm; height: 7mm; border-radius: 50%; background: var(--color-accent); color: #ffffff; display: flex; align-items: center; justify-content: center; font-size: 9pt; font-weight: 700; }}
.waypoint-coord {{ color: var(--color-muted); font-size: 8.5pt; }}
.checklist {{ list-style: none; margin: 0; padding: 0; }}
.checklist-item {{ display: flex; align-items: center; gap: 4mm; padding: 3mm 0; border-bottom: 1px dotted var(--color-border); }}
.checkbox {{ width: 5mm; height: 5mm; border: 1.5px solid var(--color-text); border-radius: 1mm; flex: 0 0 5mm; }}
.final-page {{ display: flex; flex-direction: column; justify-content: center; text-align: center; }}
.final-stats {{ display: flex; justify-content: center; gap: 10mm; margin: var(--section-gap) 0; }}
.final-stat strong {{ display: block; font-size: 24pt; color: var(--color-accent); }}
.final-quote {{ font-style: italic; color: var(--color-muted); }}
@page {{ size: A4; margin: 0; }}
"#,
            text = c.text,
            muted = c.text_muted,
            heading = c.heading,
            bg = c.background,
            surface = c.surface,
            accent = c.accent,
            border = c.border,
            heading_font = t.heading_font,
            body_font = t.body_font,
            pad = sp.page_padding_mm,
            section_gap = sp.section_gap_mm,
            block_gap = sp.block_gap_mm,
            radius = b.border_radius_px,
            shadow = shadow,
            size = t.base_size_pt,
            lh = t.line_height,
            quote_border = b.quote_border,
            quote_bg = b.quote_background,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_resolves() {
        for name in BookTheme::NAMES {
            let theme = BookTheme::named(name).unwrap();
            assert_eq!(theme.name, name);
        }
        assert!(BookTheme::named("neon").is_none());
    }

    #[test]
    fn sepia_palette() {
        let theme = BookTheme::named("Sepia").unwrap();
        assert_eq!(theme.colors.background, "#f5f1e8");
        assert_eq!(theme.colors.text, "#3e2723");
        assert_eq!(theme.colors.accent, "#8d6e63");
    }

    #[test]
    fn base_css_uses_theme_values() {
        let theme = BookTheme::black_white();
        let css = theme.base_css();
        assert!(css.contains("--color-text: #000000"));
        assert!(css.contains("--page-padding: 16mm"));
        assert!(css.contains(".pdf-page"));
        assert!(css.contains("--image-shadow: none"));
    }

    #[test]
    fn gradient_uses_both_stops() {
        let css = BookTheme::minimal().cover_gradient_css();
        assert!(css.contains("#ff9f5a 0%"));
        assert!(css.contains("#ff6b6b 100%"));
    }
}
