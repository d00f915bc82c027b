//! # Travelbook
//!
//! Turns a list of travel records into a paginated, print-ready travel book:
//! a single HTML document of fixed-size pages, optionally printed to PDF.
//!
//! # Architecture
//!
//! ```text
//! records + BookSettings
//!   → BookGenerator        (sort, compute totals, plan page numbers)
//!   → PageGenerators       (cover, toc, travel, gallery, map, checklist, final)
//!   → HtmlBuilder          (one document, base stylesheet, lang/charset/title)
//!   → ImageLoader          (optional: embed images, placeholder on failure)
//!   → PdfRenderer          (optional: headless engine prints the document)
//! ```
//!
//! Every page generator renders a fragment of `<section class="pdf-page">`
//! elements with [Maud](https://maud.lambda.xyz/), so interpolated record text
//! is escaped by construction. The orchestrator asks each generator for an
//! estimate of its page count first, which is what lets the table of contents
//! print page numbers before the pages exist.
//!
//! A single missing or slow image never fails a book. Image loads are retried
//! with backoff, run in bounded batches, and whatever still fails is swapped
//! for an inline placeholder.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Input records: travels, gallery photos, waypoints |
//! | [`config`] | `book.toml` loading, stock defaults, merging, validation |
//! | [`theme`] | Named themes and the base print stylesheet |
//! | [`plural`] | Slavic plural forms for count labels |
//! | [`blocks`] | Rich text (HTML or Markdown) to content blocks, and block templates |
//! | [`imaging`] | Image loader with retry and caches, fetcher seam, URL proxy, container rewrite |
//! | [`masonry`] | Column balancing and photo cards for galleries |
//! | [`pages`] | The page generator contract, the seven generators and their factory |
//! | [`html`] | Fluent assembler for the final document |
//! | [`generate`] | The book orchestrator |
//! | [`render`] | PDF renderer contract, option normalization, lazy engine bootstrap |
//! | [`document`] | Hand-arranged books: pages of absolutely positioned blocks |
//! | [`history`] | Undo/redo snapshots of constructed documents, with persistence |
//! | [`output`] | CLI output formatting |
//!
//! # Scheduling
//!
//! Everything runs on one thread. The binary drives a current-thread tokio
//! runtime; suspension happens only at image loads, batch joins and the
//! renderer bootstrap. Page generators therefore share dependencies through
//! `Rc` and are not `Send`.

pub mod blocks;
pub mod config;
pub mod document;
pub mod generate;
pub mod history;
pub mod html;
pub mod imaging;
pub mod masonry;
pub mod output;
pub mod pages;
pub mod plural;
pub mod render;
pub mod theme;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
