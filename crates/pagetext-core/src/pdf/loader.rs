//! Document loading: header and encryption checks, page tree resolution.

use std::collections::HashSet;
use std::io::Read;

use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, trace, warn};

use super::{text, PageSource};
use crate::error::{PageError, ParseError, Result};

/// The `%PDF-` marker may be preceded by junk within this many bytes.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Deepest page tree accepted before a branch is abandoned.
const MAX_TREE_DEPTH: usize = 64;

/// Longest chain of indirect references followed before giving up.
const MAX_REFERENCE_CHAIN: usize = 32;

/// A parsed document with its page sequence resolved.
///
/// Owned by a single parse call and dropped when it returns.
pub struct LoadedDocument {
    document: Document,
    pages: Vec<ObjectId>,
}

/// Parse raw bytes into a [`LoadedDocument`].
///
/// Fails with [`ParseError::Structural`] when the bytes are not a readable PDF
/// and with [`ParseError::Encrypted`] when the document declares encryption.
pub fn load(data: &[u8]) -> Result<LoadedDocument> {
    if data.is_empty() {
        return Err(ParseError::structural("empty input"));
    }
    let Some(offset) = find_header(data) else {
        return Err(ParseError::structural("missing %PDF- header"));
    };
    if offset > 0 {
        debug!("PDF header found at offset {}", offset);
    }
    let document = match Document::load_mem(data) {
        Ok(document) => document,
        Err(err) if trailer_declares_encryption(data) => {
            debug!("Load failed on an encrypted document: {}", err);
            return Err(ParseError::Encrypted);
        }
        Err(err) => return Err(err.into()),
    };
    if document.is_encrypted() {
        return Err(ParseError::Encrypted);
    }

    let pages = collect_pages(&document)?;
    debug!("Loaded PDF with {} pages", pages.len());

    Ok(LoadedDocument { document, pages })
}

fn find_header(data: &[u8]) -> Option<usize> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).position(|w| w == b"%PDF-")
}

/// Whether a trailer dictionary names an `/Encrypt` entry.
///
/// Only consulted when lopdf cannot load the bytes. Looks inside classic
/// `trailer << >>` dictionaries and the dictionaries of cross-reference
/// streams, never at page content or other objects.
fn trailer_declares_encryption(data: &[u8]) -> bool {
    find_all(data, b"trailer")
        .filter_map(|pos| dictionary_at(data, pos + b"trailer".len()))
        .chain(
            find_all(data, b"/XRef")
                .filter_map(|pos| enclosing_dictionary(data, pos)),
        )
        .any(has_encrypt_key)
}

fn find_all<'a>(data: &'a [u8], needle: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    data.windows(needle.len())
        .enumerate()
        .filter(move |(_, w)| *w == needle)
        .map(|(pos, _)| pos)
}

/// The `<< ... >>` dictionary starting after optional whitespace at `from`.
fn dictionary_at(data: &[u8], from: usize) -> Option<&[u8]> {
    let start = from + data.get(from..)?.iter().position(|b| !b.is_ascii_whitespace())?;
    if !data[start..].starts_with(b"<<") {
        return None;
    }
    let len = balanced_dictionary_len(&data[start..])?;
    Some(&data[start..start + len])
}

/// The innermost `<< ... >>` dictionary containing `pos`.
fn enclosing_dictionary(data: &[u8], pos: usize) -> Option<&[u8]> {
    let mut start = pos;
    loop {
        start = data[..start].windows(2).rposition(|w| w == b"<<")?;
        if let Some(len) = balanced_dictionary_len(&data[start..]) {
            if start + len > pos {
                return Some(&data[start..start + len]);
            }
        }
    }
}

/// Length of the balanced dictionary at the start of `data`, including
/// both delimiters.
fn balanced_dictionary_len(data: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = 0;
    while i + 1 < data.len() {
        match &data[i..i + 2] {
            b"<<" => {
                depth += 1;
                i += 2;
            }
            b">>" => {
                depth = depth.checked_sub(1)?;
                i += 2;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// Whether a dictionary has an `/Encrypt` key with a reference or inline
/// dictionary value. `/EncryptMetadata` and the like do not match.
fn has_encrypt_key(dict: &[u8]) -> bool {
    const KEY: &[u8] = b"/Encrypt";
    find_all(dict, KEY).any(|pos| {
        dict[pos + KEY.len()..]
            .iter()
            .copied()
            .find(|&b| !matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00))
            .is_some_and(|b| b.is_ascii_digit() || b == b'<')
    })
}

/// Walk the page tree depth-first in `/Kids` order.
///
/// Every node is visited at most once, so a `/Kids` entry pointing back up
/// the tree is skipped instead of looping.
fn collect_pages(doc: &Document) -> Result<Vec<ObjectId>> {
    let catalog = doc
        .trailer
        .get(b"Root")
        .ok()
        .and_then(|root| resolve_dict(doc, root))
        .ok_or_else(|| ParseError::structural("trailer has no readable /Root catalog"))?;

    let root_id = match catalog.get(b"Pages") {
        Ok(Object::Reference(id)) => *id,
        Ok(_) => return Err(ParseError::structural("/Pages is not an indirect reference")),
        Err(_) => return Err(ParseError::structural("catalog has no /Pages tree")),
    };
    if !matches!(doc.get_object(root_id), Ok(Object::Dictionary(_))) {
        return Err(ParseError::structural(format!(
            "page tree root {:?} is not a dictionary",
            root_id
        )));
    }

    let mut pages = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(root_id, 0usize)];

    while let Some((id, depth)) = stack.pop() {
        if !visited.insert(id) {
            warn!("Page tree node {:?} reached twice, skipping", id);
            continue;
        }
        if depth > MAX_TREE_DEPTH {
            warn!("Page tree deeper than {} levels at {:?}, skipping", MAX_TREE_DEPTH, id);
            continue;
        }
        let node = match doc.get_object(id) {
            Ok(Object::Dictionary(node)) => node,
            _ => {
                warn!("Page tree node {:?} is missing or not a dictionary, skipping", id);
                continue;
            }
        };

        if is_page_leaf(node) {
            trace!("Page {} is object {:?}", pages.len() + 1, id);
            pages.push(id);
            continue;
        }

        let kids = node
            .get(b"Kids")
            .ok()
            .and_then(|kids| match resolve(doc, kids) {
                Some(Object::Array(kids)) => Some(kids.as_slice()),
                _ => None,
            })
            .unwrap_or_default();
        for kid in kids.iter().rev() {
            match kid {
                Object::Reference(kid_id) => stack.push((*kid_id, depth + 1)),
                other => warn!("Ignoring non-reference /Kids entry: {}", kind_name(other)),
            }
        }
    }

    Ok(pages)
}

fn is_page_leaf(node: &Dictionary) -> bool {
    match node.get(b"Type") {
        Ok(Object::Name(kind)) if kind.as_slice() == b"Page" => true,
        Ok(Object::Name(kind)) if kind.as_slice() == b"Pages" => false,
        _ => node.get(b"Kids").is_err(),
    }
}

impl LoadedDocument {
    /// The underlying lopdf document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The trailer's `/Info` dictionary, if present and readable.
    pub fn info(&self) -> Option<&Dictionary> {
        self.document
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|info| resolve_dict(&self.document, info))
    }

    /// Resources of a page, inherited through the `/Parent` chain.
    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let doc = &self.document;
        let mut visited = HashSet::new();
        let mut current = page_id;
        loop {
            if !visited.insert(current) {
                warn!("Cycle in /Parent chain at {:?}", current);
                return None;
            }
            let Ok(Object::Dictionary(node)) = doc.get_object(current) else {
                return None;
            };
            if let Some(resources) = node.get(b"Resources").ok().and_then(|r| resolve_dict(doc, r)) {
                return Some(resources);
            }
            match node.get(b"Parent") {
                Ok(Object::Reference(parent)) => current = *parent,
                _ => return None,
            }
        }
    }

    /// Decoded bytes of a page's content, with multiple streams joined.
    fn page_content(&self, page_id: ObjectId) -> std::result::Result<Vec<u8>, PageError> {
        let doc = &self.document;
        let Ok(Object::Dictionary(page)) = doc.get_object(page_id) else {
            return Err(PageError::Contents("page object is not a dictionary".to_string()));
        };
        let Ok(contents) = page.get(b"Contents") else {
            return Ok(Vec::new());
        };

        match resolve(doc, contents) {
            Some(Object::Stream(stream)) => stream_bytes(stream),
            Some(Object::Array(parts)) => {
                let mut content = Vec::new();
                for part in parts {
                    match resolve(doc, part) {
                        Some(Object::Stream(stream)) => {
                            content.extend(stream_bytes(stream)?);
                            content.push(b'\n');
                        }
                        Some(Object::Null) => {}
                        Some(other) => {
                            return Err(PageError::Contents(format!(
                                "array element is {}, expected a stream",
                                kind_name(other)
                            )));
                        }
                        None => {
                            return Err(PageError::Contents("dangling reference".to_string()));
                        }
                    }
                }
                Ok(content)
            }
            Some(Object::Null) => Ok(Vec::new()),
            Some(other) => Err(PageError::Contents(format!(
                "found {}, expected a stream",
                kind_name(other)
            ))),
            None => Err(PageError::Contents("dangling reference".to_string())),
        }
    }
}

impl PageSource for LoadedDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, index: u32) -> std::result::Result<String, PageError> {
        let Some(&page_id) = self.pages.get(index as usize) else {
            return Err(PageError::Contents(format!("no page at index {}", index)));
        };
        let content = self.page_content(page_id)?;
        text::extract_text(&self.document, &content, self.page_resources(page_id))
    }
}

/// Follow indirect references to the object they point at.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    let mut current = obj;
    for _ in 0..MAX_REFERENCE_CHAIN {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    warn!("Reference chain longer than {} links", MAX_REFERENCE_CHAIN);
    None
}

pub(crate) fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Stream payload with its filters removed.
///
/// A leading `FlateDecode` is inflated strictly: lopdf logs corrupt zlib data
/// and carries on with whatever came out, which would turn a damaged page
/// into an empty one without a trace.
pub(crate) fn stream_bytes(stream: &Stream) -> std::result::Result<Vec<u8>, PageError> {
    let Ok(filters) = stream.filters() else {
        return Ok(stream.content.clone());
    };
    if filters.first() == Some(&b"FlateDecode".as_slice()) {
        let inflated = inflate(&stream.content)?;
        if filters.len() == 1 && stream.dict.get(b"DecodeParms").is_err() {
            return Ok(inflated);
        }
    }
    stream
        .decompressed_content()
        .map_err(|e| PageError::Decode(e.to_string()))
}

fn inflate(data: &[u8]) -> std::result::Result<Vec<u8>, PageError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::with_capacity(data.len() * 2);
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| PageError::Decode(format!("FlateDecode: {}", e)))?;
    Ok(out)
}

pub(crate) fn kind_name(obj: &Object) -> &'static str {
    match obj {
        Object::Null => "null",
        Object::Boolean(_) => "a boolean",
        Object::Integer(_) => "an integer",
        Object::Real(_) => "a real",
        Object::Name(_) => "a name",
        Object::String(..) => "a string",
        Object::Array(_) => "an array",
        Object::Dictionary(_) => "a dictionary",
        Object::Stream(_) => "a stream",
        Object::Reference(_) => "a reference",
    }
}
