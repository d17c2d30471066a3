//! Detection of conditions worth warning the caller about.

use tracing::debug;

use crate::models::result::Warning;
use crate::pdf::PageExtraction;

/// Build the ordered warning list for a document's page outcomes.
///
/// Page failures come first in page order. A single scan warning follows
/// when the document has pages and none of them carries text; failed pages
/// count as empty. A zero-page document is not considered scanned.
pub fn detect(pages: &[PageExtraction]) -> Vec<Warning> {
    let mut warnings: Vec<Warning> = pages
        .iter()
        .filter_map(|extraction| {
            extraction
                .outcome
                .as_ref()
                .err()
                .map(|err| Warning::PageExtractionFailed {
                    page: extraction.page,
                    reason: err.to_string(),
                })
        })
        .collect();

    if !pages.is_empty() && pages.iter().all(|p| p.text().trim().is_empty()) {
        debug!("No extractable text on any of {} pages, flagging as scanned", pages.len());
        warnings.push(Warning::ScannedDocument);
    }

    warnings
}
