//! Builders for small in-memory PDF fixtures.
//!
//! Shared with the CLI crate's tests through `#[path]`.

#![allow(dead_code)]

use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

/// Contents of one fixture page.
pub enum PageSpec {
    /// A page showing the given string in Helvetica.
    Text(&'static str),
    /// Like `Text`, with the content stream Flate-compressed.
    Compressed(&'static str),
    /// A page with the given content stream bytes, unfiltered.
    Raw(&'static [u8]),
    /// A page with no content stream at all.
    Blank,
    /// A page that only paints an image XObject.
    Image,
    /// A page whose `/Contents` entry is an integer.
    BrokenContents,
    /// A page whose content claims `FlateDecode` but is not zlib data.
    CorruptFlate,
}

/// Incrementally build a fixture document.
pub struct Fixture {
    pages: Vec<PageSpec>,
    info: Option<Dictionary>,
    encrypted: bool,
}

fn show_text(text: &str) -> Vec<u8> {
    format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text).into_bytes()
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            info: None,
            encrypted: false,
        }
    }

    /// One Helvetica text page per string.
    pub fn with_text(texts: &[&'static str]) -> Self {
        texts
            .iter()
            .fold(Self::new(), |fixture, text| fixture.page(PageSpec::Text(*text)))
    }

    pub fn page(mut self, spec: PageSpec) -> Self {
        self.pages.push(spec);
        self
    }

    pub fn info(mut self, info: Dictionary) -> Self {
        self.info = Some(info);
        self
    }

    /// Reference a standard security handler dictionary from the trailer.
    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0x80],
        ));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            "XObject" => dictionary! { "Im1" => Object::Reference(image_id) },
        });

        let mut kids = Vec::new();
        for spec in &self.pages {
            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            };
            let content = match spec {
                PageSpec::Text(text) => Some(Stream::new(dictionary! {}, show_text(text))),
                PageSpec::Compressed(text) => {
                    let mut stream = Stream::new(dictionary! {}, show_text(text));
                    stream.compress().unwrap();
                    Some(stream)
                }
                PageSpec::Raw(bytes) => Some(Stream::new(dictionary! {}, bytes.to_vec())),
                PageSpec::Blank => None,
                PageSpec::Image => Some(Stream::new(
                    dictionary! {},
                    b"q 100 0 0 100 0 0 cm /Im1 Do Q".to_vec(),
                )),
                PageSpec::BrokenContents => {
                    page.set("Contents", Object::Integer(5));
                    None
                }
                PageSpec::CorruptFlate => Some(Stream::new(
                    dictionary! { "Filter" => "FlateDecode" },
                    b"\x00\x01garbage-not-zlib".to_vec(),
                )),
            };
            if let Some(stream) = content {
                let content_id = doc.add_object(stream);
                page.set("Contents", Object::Reference(content_id));
            }
            kids.push(Object::Reference(doc.add_object(page)));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => Object::Reference(resources_id),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        if let Some(info) = self.info {
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", Object::Reference(info_id));
        }
        if self.encrypted {
            let encrypt_id = doc.add_object(dictionary! {
                "Filter" => "Standard",
                "V" => 1,
                "R" => 2,
                "O" => Object::String(vec![0; 32], StringFormat::Hexadecimal),
                "U" => Object::String(vec![0; 32], StringFormat::Hexadecimal),
                "P" => -4,
            });
            doc.trailer.set("Encrypt", Object::Reference(encrypt_id));
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }
}

/// A literal PDF string.
pub fn literal(text: &str) -> Object {
    Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
}

/// A UTF-16BE PDF text string with a byte order mark.
pub fn utf16(text: &str) -> Object {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
