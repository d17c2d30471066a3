//! PDF processing module.

mod encoding;
mod loader;
mod metadata;
mod syntax;
mod text;

pub use loader::{load, LoadedDocument};
pub use metadata::extract_metadata;
pub use text::{extract_pages, PageExtraction};

use crate::error::PageError;

/// Page-by-page access to a document's text.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Text of the page at a 0-based index.
    fn page_text(&self, index: u32) -> Result<String, PageError>;
}
