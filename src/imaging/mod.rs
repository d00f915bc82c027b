//! Image handling for the book.
//!
//! | Piece | Role |
//! |---|---|
//! | [`fetch`] | [`ImageFetcher`] seam, reqwest-backed [`HttpFetcher`] |
//! | [`loader`] | [`ImageLoader`]: timeout, retry with backoff, caches, batches |
//! | [`container`] | rewrite every `<img>` of a document, placeholder on failure |
//! | [`proxy`] | [`ImageProxy`]: size-normalizing URL rewrite |

pub mod container;
pub mod fetch;
pub mod loader;
pub mod proxy;

pub use container::{ContainerReport, PLACEHOLDER_SVG, image_sources, placeholder_data_url};
pub use fetch::{FetchError, HttpFetcher, ImageFetcher};
pub use loader::{
    Backoff, ImageLoader, LoadError, LoadedImage, LoaderOptions, LoaderStats, exponential_backoff,
};
pub use proxy::ImageProxy;
