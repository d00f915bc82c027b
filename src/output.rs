//! CLI output formatting.
//!
//! Output is information-first: every entity (travel, page block) leads with
//! its positional index and title, with details on indented context lines.
//!
//! ## Check
//!
//! ```text
//! Travels
//! 001 Кавказ (Грузия, 2022)
//!     Photos: 2
//!     Waypoints: 2 (2 located)
//! 002 Рим (Италия, 2019)
//!     Photos: 1
//!     Waypoints: 1 (1 located)
//!     Warning: no cover image
//!
//! Book
//!     Title: Книга путешествий
//!     Sort order: date-desc
//!     Theme: minimal
//! ```
//!
//! ## Generate
//!
//! ```text
//! Книга путешествий (2 travels, 2019–2022)
//! 001 cover → p. 1
//! 002 toc → p. 2
//! 003 travel: Кавказ → p. 3-4
//! 004 gallery: Кавказ → p. 5
//!
//! Generated 5 pages
//! Images: 3 sources, 2 loaded, 1 placeholder
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::config::BookConfig;
use crate::generate::{BookSummary, PageSummary};
use crate::types::TravelRecord;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// `p. 3` or `p. 3-4`.
fn page_span(block: &PageSummary) -> String {
    if block.pages <= 1 {
        format!("p. {}", block.first_page)
    } else {
        format!("p. {}-{}", block.first_page, block.first_page + block.pages - 1)
    }
}

/// Travel header: index, name, then country and year when known.
///
/// ```text
/// 001 Кавказ (Грузия, 2022)
/// 003 Браславские озёра (2021)
/// 004 (untitled)
/// ```
fn travel_header(index: usize, record: &TravelRecord) -> String {
    let name = record.name.trim();
    let name = if name.is_empty() { "(untitled)" } else { name };
    let details: Vec<String> = record
        .country_label()
        .map(str::to_string)
        .into_iter()
        .chain(record.year.map(|y| y.to_string()))
        .collect();
    if details.is_empty() {
        format!("{} {}", format_index(index), name)
    } else {
        format!("{} {} ({})", format_index(index), name, details.join(", "))
    }
}

fn record_warnings(record: &TravelRecord) -> Vec<String> {
    let mut warnings = Vec::new();
    if record.name.trim().is_empty() {
        warnings.push("no name".to_string());
    }
    if record.year.is_none() {
        warnings.push("no year, sorted as 0".to_string());
    }
    if record.primary_photo().is_none() {
        warnings.push("no cover image".to_string());
    }
    let unparsable = record
        .waypoints
        .iter()
        .filter(|w| w.coord.is_some() && w.point().is_none())
        .count();
    if unparsable > 0 {
        warnings.push(format!(
            "{} with unreadable coordinates",
            plural(unparsable, "waypoint", "waypoints")
        ));
    }
    warnings
}

/// Format `check` output: the records as they will be read, then the
/// effective book settings.
pub fn format_check_output(config: &BookConfig, records: &[TravelRecord]) -> Vec<String> {
    let mut lines = vec!["Travels".to_string()];
    if records.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, record) in records.iter().enumerate() {
        lines.push(travel_header(i + 1, record));
        lines.push(format!("{}Photos: {}", indent(1), record.gallery.len()));
        lines.push(format!(
            "{}Waypoints: {} ({} located)",
            indent(1),
            record.waypoints.len(),
            record.located_waypoints().len()
        ));
        for warning in record_warnings(record) {
            lines.push(format!("{}Warning: {}", indent(1), warning));
        }
    }

    let book = &config.book;
    lines.push(String::new());
    lines.push("Book".to_string());
    lines.push(format!("{}Title: {}", indent(1), crate::pages::book_title(book)));
    lines.push(format!("{}Sort order: {}", indent(1), book.sort_order.as_str()));
    lines.push(format!("{}Theme: {}", indent(1), book.theme));
    if book.include_checklists {
        let sections: Vec<&str> = book
            .effective_checklist_sections()
            .into_iter()
            .map(|s| s.label())
            .collect();
        lines.push(format!("{}Checklists: {}", indent(1), sections.join(", ")));
    }
    lines.push(format!(
        "{}Paper: {} {}",
        indent(1),
        config.render.format,
        config.render.orientation
    ));
    lines
}

/// Format `generate` output: one line per emitted block of pages.
pub fn format_generate_output(summary: &BookSummary) -> Vec<String> {
    let mut header = format!(
        "{} ({}",
        summary.title,
        plural(summary.travels, "travel", "travels")
    );
    if let Some(range) = &summary.year_range {
        header.push_str(&format!(", {range}"));
    }
    header.push(')');

    let mut lines = vec![header];
    for (i, block) in summary.pages.iter().enumerate() {
        let title = match &block.label {
            Some(label) => format!("{}: {}", block.page_type, label),
            None => block.page_type.to_string(),
        };
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            title,
            page_span(block)
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "Generated {}",
        plural(summary.page_count(), "page", "pages")
    ));
    if let Some(report) = &summary.images {
        lines.push(format!(
            "Images: {}, {} loaded, {}",
            plural(report.sources, "source", "sources"),
            report.loaded,
            plural(report.replaced, "placeholder", "placeholders")
        ));
    }
    lines
}

pub fn format_pdf_output(path: &Path, bytes: usize) -> Vec<String> {
    vec![format!("PDF → {} ({} KiB)", path.display(), bytes.div_ceil(1024))]
}

pub fn print_check_output(config: &BookConfig, records: &[TravelRecord]) {
    for line in format_check_output(config, records) {
        println!("{}", line);
    }
}

pub fn print_generate_output(summary: &BookSummary) {
    for line in format_generate_output(summary) {
        println!("{}", line);
    }
}

pub fn print_pdf_output(path: &Path, bytes: usize) {
    for line in format_pdf_output(path, bytes) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ContainerReport;
    use crate::pages::PageType;
    use crate::test_helpers::*;
    use crate::types::Waypoint;

    fn summary() -> BookSummary {
        BookSummary {
            title: "Книга путешествий".into(),
            travels: 2,
            year_range: Some("2019–2022".into()),
            pages: vec![
                PageSummary {
                    page_type: PageType::Cover,
                    first_page: 1,
                    pages: 1,
                    label: None,
                },
                PageSummary {
                    page_type: PageType::Travel,
                    first_page: 2,
                    pages: 2,
                    label: Some("Кавказ".into()),
                },
            ],
            images: None,
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(120), "120");
    }

    #[test]
    fn generate_output_lists_page_spans() {
        let lines = format_generate_output(&summary());
        assert_eq!(lines[0], "Книга путешествий (2 travels, 2019–2022)");
        assert_eq!(lines[1], "001 cover → p. 1");
        assert_eq!(lines[2], "002 travel: Кавказ → p. 2-3");
        assert_eq!(lines.last().unwrap(), "Generated 3 pages");
    }

    #[test]
    fn generate_output_reports_images() {
        let mut s = summary();
        s.travels = 1;
        s.year_range = None;
        s.images = Some(ContainerReport {
            sources: 3,
            loaded: 2,
            replaced: 1,
        });
        let lines = format_generate_output(&s);
        assert_eq!(lines[0], "Книга путешествий (1 travel)");
        assert_eq!(lines.last().unwrap(), "Images: 3 sources, 2 loaded, 1 placeholder");
    }

    #[test]
    fn check_output_flags_problems() {
        let mut records = sample_records();
        records[2].waypoints = vec![Waypoint {
            address: "Озеро".into(),
            coord: Some("north,east".into()),
            category: None,
        }];
        records[2].year = None;
        let lines = format_check_output(&BookConfig::default(), &records);
        assert_eq!(lines[0], "Travels");
        assert_eq!(lines[1], "001 Кавказ (Грузия, 2022)");
        assert!(lines.contains(&"    Waypoints: 2 (2 located)".to_string()));
        assert!(lines.contains(&"003 Браславские озёра (Беларусь)".to_string()));
        assert!(lines.contains(&"    Warning: no year, sorted as 0".to_string()));
        assert!(lines.contains(&"    Warning: no cover image".to_string()));
        assert!(lines.contains(&"    Warning: 1 waypoint with unreadable coordinates".to_string()));
        assert!(lines.contains(&"    Paper: a4 portrait".to_string()));
    }

    #[test]
    fn check_output_empty_records() {
        let lines = format_check_output(&BookConfig::default(), &[]);
        assert_eq!(lines[1], "    (none)");
    }

    #[test]
    fn pdf_output_rounds_up_kib() {
        assert_eq!(
            format_pdf_output(Path::new("book.pdf"), 1025),
            vec!["PDF → book.pdf (2 KiB)".to_string()]
        );
    }
}
