//! Glyph code to text decoding for fonts.
//!
//! Glyph codes shown with a simple font decode through a WinAnsi base table
//! with `/Differences` applied on top. Fonts with a `ToUnicode` CMap decode
//! through the CMap instead. Info dictionary strings go through lopdf's own
//! `decode_text_string`.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};
use tracing::trace;

use super::loader::{resolve, stream_bytes};

/// Upper bound on codes expanded from one `bfrange` entry.
const MAX_RANGE_SPAN: u32 = 0x1_0000;

fn decode_utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

fn win_ansi_char(b: u8) -> Option<char> {
    match b {
        b'\t' | b'\n' | b'\r' => Some(' '),
        0x20..=0x7E => Some(b as char),
        0x80..=0x9F => WIN_ANSI_HIGH[(b - 0x80) as usize],
        0xA0..=0xFF => Some(b as char),
        _ => None,
    }
}

/// Glyph names that are not a single character or a `uniXXXX` form.
const GLYPH_NAMES: &[(&str, char)] = &[
    ("space", ' '),
    ("exclam", '!'),
    ("quotedbl", '"'),
    ("numbersign", '#'),
    ("dollar", '$'),
    ("percent", '%'),
    ("ampersand", '&'),
    ("quotesingle", '\''),
    ("quoteright", '\u{2019}'),
    ("quoteleft", '\u{2018}'),
    ("quotedblleft", '\u{201C}'),
    ("quotedblright", '\u{201D}'),
    ("parenleft", '('),
    ("parenright", ')'),
    ("asterisk", '*'),
    ("plus", '+'),
    ("comma", ','),
    ("hyphen", '-'),
    ("period", '.'),
    ("slash", '/'),
    ("zero", '0'),
    ("one", '1'),
    ("two", '2'),
    ("three", '3'),
    ("four", '4'),
    ("five", '5'),
    ("six", '6'),
    ("seven", '7'),
    ("eight", '8'),
    ("nine", '9'),
    ("colon", ':'),
    ("semicolon", ';'),
    ("less", '<'),
    ("equal", '='),
    ("greater", '>'),
    ("question", '?'),
    ("at", '@'),
    ("bracketleft", '['),
    ("backslash", '\\'),
    ("bracketright", ']'),
    ("underscore", '_'),
    ("braceleft", '{'),
    ("bar", '|'),
    ("braceright", '}'),
    ("bullet", '\u{2022}'),
    ("endash", '\u{2013}'),
    ("emdash", '\u{2014}'),
    ("ellipsis", '\u{2026}'),
    ("fi", '\u{FB01}'),
    ("fl", '\u{FB02}'),
    ("Euro", '\u{20AC}'),
    ("copyright", '\u{00A9}'),
    ("registered", '\u{00AE}'),
    ("trademark", '\u{2122}'),
    ("degree", '\u{00B0}'),
    ("nbspace", '\u{00A0}'),
];

fn glyph_to_char(name: &[u8]) -> Option<char> {
    let name = std::str::from_utf8(name).ok()?;
    if let [b] = name.as_bytes() {
        if b.is_ascii_alphanumeric() {
            return Some(*b as char);
        }
    }
    if let Some(hex) = name.strip_prefix("uni").or_else(|| name.strip_prefix('u')) {
        if (4..=6).contains(&hex.len()) {
            if let Some(c) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                return Some(c);
            }
        }
    }
    GLYPH_NAMES
        .iter()
        .find(|(glyph, _)| *glyph == name)
        .map(|(_, c)| *c)
}

/// Single-byte code to character table of a simple font.
#[derive(Debug, Clone)]
pub(crate) struct SimpleEncoding {
    table: [Option<char>; 256],
}

impl Default for SimpleEncoding {
    fn default() -> Self {
        let mut table = [None; 256];
        for (code, slot) in table.iter_mut().enumerate() {
            *slot = win_ansi_char(code as u8);
        }
        Self { table }
    }
}

impl SimpleEncoding {
    /// Build from a font's `/Encoding` entry. Named base encodings all map
    /// onto the WinAnsi table, `/Differences` are applied on top.
    fn from_font(doc: &Document, font: &Dictionary) -> Self {
        let mut encoding = Self::default();
        let Some(Object::Dictionary(dict)) = font.get(b"Encoding").ok().and_then(|e| resolve(doc, e))
        else {
            return encoding;
        };
        let Some(Object::Array(differences)) =
            dict.get(b"Differences").ok().and_then(|d| resolve(doc, d))
        else {
            return encoding;
        };

        let mut code: usize = 0;
        for item in differences {
            match item {
                Object::Integer(start) => code = (*start).clamp(0, 255) as usize,
                Object::Name(name) => {
                    if code < 256 {
                        if let Some(c) = glyph_to_char(name) {
                            encoding.table[code] = Some(c);
                        }
                    }
                    code += 1;
                }
                _ => {}
            }
        }
        encoding
    }

    fn char_for(&self, code: u8) -> Option<char> {
        self.table[code as usize]
    }

    pub(crate) fn decode(&self, bytes: &[u8]) -> String {
        bytes.iter().filter_map(|&b| self.char_for(b)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b if b.is_ascii_whitespace() || b == 0 => i += 1,
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'<' => {
                i += 1;
                let mut digits = Vec::new();
                while i < data.len() && data[i] != b'>' {
                    if data[i].is_ascii_hexdigit() {
                        digits.push(data[i]);
                    }
                    i += 1;
                }
                i += 1;
                if digits.len() % 2 == 1 {
                    digits.push(b'0');
                }
                let bytes = digits
                    .chunks_exact(2)
                    .filter_map(|pair| {
                        std::str::from_utf8(pair)
                            .ok()
                            .and_then(|s| u8::from_str_radix(s, 16).ok())
                    })
                    .collect();
                tokens.push(Token::Hex(bytes));
            }
            b'>' | b'{' | b'}' | b')' => i += 1,
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'(' => {
                let mut depth = 0usize;
                while i < data.len() {
                    match data[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                i += 1;
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
            }
            _ => {
                let start = i;
                i += 1;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !is_delimiter(data[i])
                {
                    i += 1;
                }
                tokens.push(Token::Word(String::from_utf8_lossy(&data[start..i]).into_owned()));
            }
        }
    }
    tokens
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

/// Mapping from character codes to Unicode text, parsed from a CMap stream.
#[derive(Debug, Clone, Default)]
pub(crate) struct ToUnicodeMap {
    codespace: Vec<(Vec<u8>, Vec<u8>)>,
    map: HashMap<(usize, u32), String>,
    default_width: usize,
}

impl ToUnicodeMap {
    pub(crate) fn parse(data: &[u8], default_width: usize) -> Self {
        let tokens = tokenize(data);
        let mut cmap = Self {
            default_width,
            ..Self::default()
        };
        let mut widest_source = 0;

        let mut i = 0;
        while i < tokens.len() {
            let Token::Word(word) = &tokens[i] else {
                i += 1;
                continue;
            };
            i += 1;
            match word.as_str() {
                "begincodespacerange" => {
                    while let (Some(Token::Hex(lo)), Some(Token::Hex(hi))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        if lo.len() == hi.len() && !lo.is_empty() {
                            cmap.codespace.push((lo.clone(), hi.clone()));
                        }
                        i += 2;
                    }
                }
                "beginbfchar" => {
                    while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        widest_source = widest_source.max(src.len());
                        cmap.map
                            .insert((src.len(), code_value(src)), decode_utf16be(dst));
                        i += 2;
                    }
                }
                "beginbfrange" => {
                    while let (Some(Token::Hex(lo)), Some(Token::Hex(hi))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        widest_source = widest_source.max(lo.len());
                        let width = lo.len();
                        let (lo, hi) = (code_value(lo), code_value(hi));
                        i += 2;
                        match tokens.get(i) {
                            Some(Token::Hex(dst)) => {
                                cmap.insert_incrementing(width, lo, hi, dst);
                                i += 1;
                            }
                            Some(Token::ArrayStart) => {
                                i += 1;
                                let mut code = lo;
                                while let Some(Token::Hex(dst)) = tokens.get(i) {
                                    if code <= hi {
                                        cmap.map.insert((width, code), decode_utf16be(dst));
                                    }
                                    code = code.saturating_add(1);
                                    i += 1;
                                }
                                if tokens.get(i) == Some(&Token::ArrayEnd) {
                                    i += 1;
                                }
                            }
                            _ => break,
                        }
                    }
                }
                _ => {}
            }
        }

        if cmap.codespace.is_empty() && widest_source > 0 {
            cmap.default_width = widest_source;
        }
        trace!(
            "Parsed ToUnicode CMap: {} mappings, {} codespace ranges",
            cmap.map.len(),
            cmap.codespace.len()
        );
        cmap
    }

    fn insert_incrementing(&mut self, width: usize, lo: u32, hi: u32, dst: &[u8]) {
        if hi < lo || hi - lo >= MAX_RANGE_SPAN {
            return;
        }
        let mut units: Vec<u16> = dst
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        if units.is_empty() {
            return;
        }
        for code in lo..=hi {
            self.map
                .insert((width, code), String::from_utf16_lossy(&units));
            if let Some(last) = units.last_mut() {
                *last = last.wrapping_add(1);
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn code_width(&self, rest: &[u8]) -> usize {
        for (lo, hi) in &self.codespace {
            let n = lo.len();
            if rest.len() >= n
                && rest[..n]
                    .iter()
                    .zip(lo.iter().zip(hi))
                    .all(|(b, (l, h))| (*l..=*h).contains(b))
            {
                return n;
            }
        }
        self.default_width.clamp(1, rest.len().max(1))
    }

    fn decode(&self, bytes: &[u8], fallback: Option<&SimpleEncoding>) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < bytes.len() {
            let width = self.code_width(&bytes[i..]).min(bytes.len() - i);
            let code = &bytes[i..i + width];
            match self.map.get(&(width, code_value(code))) {
                Some(text) => out.push_str(text),
                None => {
                    if let (1, Some(simple)) = (width, fallback) {
                        out.extend(simple.char_for(code[0]));
                    }
                }
            }
            i += width;
        }
        out
    }
}

/// Decodes glyph codes shown with one font into text.
#[derive(Debug, Clone)]
pub(crate) struct FontDecoder {
    to_unicode: Option<ToUnicodeMap>,
    /// `None` for composite (Type0) fonts.
    simple: Option<SimpleEncoding>,
}

/// Used when no font is selected or the selected one cannot be resolved.
impl Default for FontDecoder {
    fn default() -> Self {
        Self {
            to_unicode: None,
            simple: Some(SimpleEncoding::default()),
        }
    }
}

impl FontDecoder {
    pub(crate) fn from_font(doc: &Document, font: &Dictionary) -> Self {
        let composite = matches!(
            font.get(b"Subtype"),
            Ok(Object::Name(subtype)) if subtype.as_slice() == b"Type0"
        );

        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|obj| match resolve(doc, obj) {
                Some(Object::Stream(stream)) => stream_bytes(stream).ok(),
                _ => None,
            })
            .map(|data| ToUnicodeMap::parse(&data, if composite { 2 } else { 1 }))
            .filter(|cmap| !cmap.is_empty());

        let simple = (!composite).then(|| SimpleEncoding::from_font(doc, font));

        Self { to_unicode, simple }
    }

    pub(crate) fn decode(&self, bytes: &[u8]) -> String {
        if let Some(cmap) = &self.to_unicode {
            return cmap.decode(bytes, self.simple.as_ref());
        }
        match &self.simple {
            Some(simple) => simple.decode(bytes),
            None => {
                trace!("Composite font without ToUnicode, {} bytes dropped", bytes.len());
                String::new()
            }
        }
    }
}
