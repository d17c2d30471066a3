//! Info dictionary metadata.

use lopdf::Object;
use tracing::debug;

use super::loader::{resolve, LoadedDocument};
use super::PageSource;
use crate::models::result::Metadata;

/// Read title, author and creation date from the document's info dictionary.
///
/// Missing, non-string or blank entries are absent. `num_pages` always comes
/// from the loader's page tree walk.
pub fn extract_metadata(doc: &LoadedDocument) -> Metadata {
    let info = doc.info();
    let field = |key: &[u8]| -> Option<String> {
        text_value(resolve(doc.document(), info?.get(key).ok()?)?)
    };

    Metadata {
        title: field(b"Title"),
        author: field(b"Author"),
        creation_date: field(b"CreationDate"),
        num_pages: doc.page_count(),
    }
}

fn text_value(value: &Object) -> Option<String> {
    let Object::String(..) = value else {
        return None;
    };
    match lopdf::decode_text_string(value) {
        Ok(text) => clean(text),
        Err(e) => {
            debug!("Undecodable info string: {}", e);
            None
        }
    }
}

fn clean(value: String) -> Option<String> {
    let trimmed = value.trim_matches(|c: char| c.is_whitespace() || c == '\0' || c == '\u{FEFF}');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
