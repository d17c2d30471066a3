//! Output records of the parsing pipeline.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Text of the warning emitted for documents with no extractable text.
pub const SCANNED_WARNING: &str =
    "document appears to be scanned/image-only, no extractable text found";

/// Descriptive metadata from the document's info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title.
    pub title: Option<String>,

    /// Document author.
    pub author: Option<String>,

    /// Raw PDF creation date (e.g. `D:20240101120000Z`), not reformatted.
    pub creation_date: Option<String>,

    /// Number of pages found by the page tree walk.
    pub num_pages: u32,
}

/// Text recovered from a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Page number (1-indexed).
    pub page: u32,

    /// Extracted text, possibly empty.
    pub text: String,
}

/// A condition detected while parsing that the caller should know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// One page's content could not be read; its text was left empty.
    PageExtractionFailed {
        /// Page number (1-indexed).
        page: u32,
        /// Why extraction failed.
        reason: String,
    },

    /// No page of the document carries extractable text.
    ScannedDocument,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::PageExtractionFailed { page, reason } => {
                write!(f, "page {page}: text extraction failed, page left empty ({reason})")
            }
            Warning::ScannedDocument => f.write_str(SCANNED_WARNING),
        }
    }
}

impl Serialize for Warning {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The complete result of one parse call.
///
/// Built once by [`crate::pipeline::assemble`] and read through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    metadata: Metadata,

    #[serde(skip_serializing_if = "Option::is_none")]
    pages: Option<Vec<PageRecord>>,

    warnings: Vec<Warning>,
}

impl ParseResult {
    pub(crate) fn new(
        metadata: Metadata,
        pages: Option<Vec<PageRecord>>,
        warnings: Vec<Warning>,
    ) -> Self {
        Self {
            metadata,
            pages,
            warnings,
        }
    }

    /// Document metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Per-page text, or `None` when pages were not requested.
    pub fn pages(&self) -> Option<&[PageRecord]> {
        self.pages.as_deref()
    }

    /// Detected conditions, page failures first.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Whether the document was classified as scanned/image-only.
    pub fn is_scanned(&self) -> bool {
        self.warnings.contains(&Warning::ScannedDocument)
    }
}
