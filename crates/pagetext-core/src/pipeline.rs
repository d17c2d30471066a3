//! The parse pipeline: load, extract, detect, assemble.

use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;
use crate::models::config::ParseOptions;
use crate::models::result::{Metadata, PageRecord, ParseResult, Warning};
use crate::pdf;
use crate::scan;
use crate::source::ByteSource;

/// Parse a document from any byte source.
pub fn parse(source: ByteSource, options: &ParseOptions) -> Result<ParseResult> {
    let data = source.read()?;
    parse_bytes(&data, options)
}

/// Parse a document from a file path.
pub fn parse_path(path: impl AsRef<Path>, options: &ParseOptions) -> Result<ParseResult> {
    parse(ByteSource::Path(path.as_ref().to_path_buf()), options)
}

/// Parse a document held in memory.
///
/// Pages are always extracted, even when `options.include_pages` is false,
/// so the warnings are the same in both modes.
pub fn parse_bytes(data: &[u8], options: &ParseOptions) -> Result<ParseResult> {
    let doc = pdf::load(data)?;
    let metadata = pdf::extract_metadata(&doc);
    let extractions = pdf::extract_pages(&doc);
    let warnings = scan::detect(&extractions);

    let pages: Vec<PageRecord> = extractions
        .into_iter()
        .map(|extraction| PageRecord {
            page: extraction.page,
            text: extraction.outcome.unwrap_or_default(),
        })
        .collect();

    info!(
        "Parsed PDF: {} pages, {} warnings",
        metadata.num_pages,
        warnings.len()
    );
    Ok(assemble(metadata, pages, warnings, options.include_pages))
}

/// Combine the pipeline outputs into a [`ParseResult`].
///
/// With `include_pages` false the page records are dropped and the result
/// carries no `pages` at all.
pub fn assemble(
    metadata: Metadata,
    pages: Vec<PageRecord>,
    warnings: Vec<Warning>,
    include_pages: bool,
) -> ParseResult {
    if !include_pages {
        debug!("Dropping {} page records (metadata-only mode)", pages.len());
    }
    ParseResult::new(metadata, include_pages.then_some(pages), warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_keeps_pages() {
        let pages = vec![PageRecord {
            page: 1,
            text: "Hello".to_string(),
        }];
        let result = assemble(Metadata::default(), pages.clone(), vec![], true);
        assert_eq!(result.pages(), Some(pages.as_slice()));
    }

    #[test]
    fn test_assemble_metadata_only() {
        let pages = vec![PageRecord {
            page: 1,
            text: String::new(),
        }];
        let result = assemble(
            Metadata::default(),
            pages,
            vec![Warning::ScannedDocument],
            false,
        );
        assert_eq!(result.pages(), None);
        assert!(result.is_scanned());
    }
}
