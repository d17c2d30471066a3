//! Page text recovery by walking content stream operators.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::PageSource;
use super::encoding::FontDecoder;
use super::loader::{resolve_dict, stream_bytes};
use super::syntax;
use crate::error::PageError;

/// Form XObjects nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 12;

/// `TJ` adjustment (thousandths of a text space unit) read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// Text extraction outcome for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExtraction {
    /// Page number (1-indexed).
    pub page: u32,
    /// Recovered text, or why the page could not be read.
    pub outcome: Result<String, PageError>,
}

impl PageExtraction {
    /// Text of the page; failed pages read as empty.
    pub fn text(&self) -> &str {
        self.outcome.as_deref().unwrap_or("")
    }
}

/// Extract every page in document order.
///
/// A page that fails is recorded as a failure and the walk moves on.
pub fn extract_pages<S: PageSource + ?Sized>(source: &S) -> Vec<PageExtraction> {
    let count = source.page_count();
    let extractions: Vec<PageExtraction> = (0..count)
        .map(|index| {
            let page = index + 1;
            let outcome = source.page_text(index);
            match &outcome {
                Ok(text) => trace!("Page {}: {} chars", page, text.chars().count()),
                Err(err) => warn!("Page {} text extraction failed: {}", page, err),
            }
            PageExtraction { page, outcome }
        })
        .collect();

    debug!(
        "Extracted {} pages, {} failed",
        count,
        extractions.iter().filter(|e| e.outcome.is_err()).count()
    );
    extractions
}

/// Recover the text of one content stream.
pub(crate) fn extract_text(
    doc: &Document,
    content: &[u8],
    resources: Option<&Dictionary>,
) -> Result<String, PageError> {
    let mut walker = ContentWalker::new(doc);
    walker.walk(content, resources, 0)?;
    Ok(walker.out.finish())
}

#[derive(Debug, Default)]
struct TextBuffer {
    text: String,
}

impl TextBuffer {
    fn push(&mut self, run: &str) {
        self.text.push_str(run);
    }

    fn line_break(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
    }

    fn space(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with(char::is_whitespace) {
            self.text.push(' ');
        }
    }

    fn finish(self) -> String {
        self.text
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

struct ContentWalker<'a> {
    doc: &'a Document,
    out: TextBuffer,
    fonts: HashMap<ObjectId, Rc<FontDecoder>>,
    font: Option<Rc<FontDecoder>>,
    fallback: FontDecoder,
    /// Form XObjects on the current nesting path.
    forms: HashSet<ObjectId>,
}

impl<'a> ContentWalker<'a> {
    fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            out: TextBuffer::default(),
            fonts: HashMap::new(),
            font: None,
            fallback: FontDecoder::default(),
            forms: HashSet::new(),
        }
    }

    fn walk(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        depth: usize,
    ) -> Result<(), PageError> {
        syntax::check_content(content)?;
        let content = Content::decode(content).map_err(|e| PageError::Syntax(e.to_string()))?;
        for operation in &content.operations {
            self.apply(operation, resources, depth)?;
        }
        Ok(())
    }

    fn apply(
        &mut self,
        op: &Operation,
        resources: Option<&'a Dictionary>,
        depth: usize,
    ) -> Result<(), PageError> {
        match op.operator.as_str() {
            "Tf" => {
                self.font = match op.operands.first() {
                    Some(Object::Name(name)) => self.lookup_font(resources, name),
                    _ => None,
                };
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes),
                            other => {
                                if number(other).is_some_and(|n| n < TJ_SPACE_THRESHOLD) {
                                    self.out.space();
                                }
                            }
                        }
                    }
                }
            }
            "'" => {
                self.out.line_break();
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                self.out.line_break();
                if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                    self.show(bytes);
                }
            }
            "Td" | "TD" => {
                let tx = op.operands.first().and_then(number).unwrap_or(0.0);
                let ty = op.operands.get(1).and_then(number).unwrap_or(0.0);
                if ty != 0.0 {
                    self.out.line_break();
                } else if tx > 0.0 {
                    self.out.space();
                }
            }
            "T*" | "Tm" | "ET" => self.out.line_break(),
            "Do" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    self.draw_xobject(resources, name, depth)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn show(&mut self, bytes: &[u8]) {
        let run = match &self.font {
            Some(font) => font.decode(bytes),
            None => self.fallback.decode(bytes),
        };
        self.out.push(&run);
    }

    fn lookup_font(&mut self, resources: Option<&'a Dictionary>, name: &[u8]) -> Option<Rc<FontDecoder>> {
        let doc = self.doc;
        let fonts = resolve_dict(doc, resources?.get(b"Font").ok()?)?;
        let entry = fonts.get(name).ok()?;

        let Object::Reference(id) = entry else {
            return resolve_dict(doc, entry).map(|font| Rc::new(FontDecoder::from_font(doc, font)));
        };
        if let Some(font) = self.fonts.get(id) {
            return Some(Rc::clone(font));
        }
        let font = Rc::new(FontDecoder::from_font(doc, resolve_dict(doc, entry)?));
        self.fonts.insert(*id, Rc::clone(&font));
        Some(font)
    }

    /// Enter a Form XObject; image XObjects carry no text and are skipped.
    fn draw_xobject(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        depth: usize,
    ) -> Result<(), PageError> {
        let doc = self.doc;
        let Some(xobjects) = resources
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|x| resolve_dict(doc, x))
        else {
            return Ok(());
        };
        let Ok(Object::Reference(id)) = xobjects.get(name) else {
            return Ok(());
        };
        let Ok(Object::Stream(stream)) = doc.get_object(*id) else {
            return Ok(());
        };
        match stream.dict.get(b"Subtype") {
            Ok(Object::Name(subtype)) if subtype.as_slice() == b"Form" => {}
            _ => {
                trace!("Skipping non-form XObject {:?}", id);
                return Ok(());
            }
        }
        if depth >= MAX_FORM_DEPTH || !self.forms.insert(*id) {
            warn!("Form XObject {:?} is recursive or nested too deep, skipping", id);
            return Ok(());
        }

        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|r| resolve_dict(doc, r))
            .or(resources);
        let result = stream_bytes(stream).and_then(|bytes| {
            let saved_font = self.font.clone();
            let walked = self.walk(&bytes, form_resources, depth + 1);
            self.font = saved_font;
            walked
        });
        self.forms.remove(id);
        result
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(n) => Some(*n as f32),
        Object::Real(n) => Some(*n as f32),
        _ => None,
    }
}
