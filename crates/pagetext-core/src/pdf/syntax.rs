//! Lexical validation of content streams.
//!
//! lopdf's content parser stops at the first token it cannot read and returns
//! the operations before it, so a damaged stream looks like a short one. This
//! pass walks the whole stream first and reports where it breaks.

use crate::error::PageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Array,
    Dict,
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn syntax(offset: usize, msg: &str) -> PageError {
    PageError::Syntax(format!("{} at byte {}", msg, offset))
}

/// Check that a content stream tokenizes completely.
///
/// Fails on unterminated strings, unbalanced or stray delimiters, operators
/// inside arrays or dictionaries, and trailing operands with no operator.
pub(crate) fn check_content(data: &[u8]) -> Result<(), PageError> {
    let mut stack: Vec<Container> = Vec::new();
    let mut pending_operands = 0usize;
    let mut i = 0;

    while i < data.len() {
        let start = i;
        match data[i] {
            b if is_whitespace(b) => {
                i += 1;
                continue;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
                continue;
            }
            b'(' => i = skip_literal_string(data, i)?,
            b'<' if data.get(i + 1) == Some(&b'<') => {
                stack.push(Container::Dict);
                i += 2;
                continue;
            }
            b'>' if data.get(i + 1) == Some(&b'>') => {
                if stack.pop() != Some(Container::Dict) {
                    return Err(syntax(start, "unbalanced '>>'"));
                }
                i += 2;
            }
            b'<' => i = skip_hex_string(data, i)?,
            b'[' => {
                stack.push(Container::Array);
                i += 1;
                continue;
            }
            b']' => {
                if stack.pop() != Some(Container::Array) {
                    return Err(syntax(start, "unbalanced ']'"));
                }
                i += 1;
            }
            b'/' => {
                i += 1;
                while i < data.len() && !is_whitespace(data[i]) && !is_delimiter(data[i]) {
                    i += 1;
                }
            }
            b')' | b'>' | b'{' | b'}' => {
                return Err(syntax(start, &format!("stray '{}'", data[i] as char)));
            }
            _ => {
                while i < data.len() && !is_whitespace(data[i]) && !is_delimiter(data[i]) {
                    i += 1;
                }
                let word = &data[start..i];
                if !is_operand_word(word) {
                    if !stack.is_empty() {
                        return Err(syntax(start, "operator inside array or dictionary"));
                    }
                    if word == b"BI" {
                        i = skip_inline_image(data, i)?;
                    }
                    pending_operands = 0;
                    continue;
                }
            }
        }

        // Nested values count once, when their container closes.
        if stack.is_empty() {
            pending_operands += 1;
        }
    }

    if !stack.is_empty() {
        return Err(syntax(data.len(), "unclosed array or dictionary"));
    }
    if pending_operands > 0 {
        return Err(syntax(data.len(), "operands without an operator"));
    }
    Ok(())
}

fn is_operand_word(word: &[u8]) -> bool {
    matches!(word, b"true" | b"false" | b"null")
        || word
            .first()
            .is_some_and(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'))
}

/// Returns the offset just past the closing parenthesis.
fn skip_literal_string(data: &[u8], start: usize) -> Result<usize, PageError> {
    let mut depth = 0usize;
    let mut i = start;
    while i < data.len() {
        match data[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(syntax(start, "unterminated string"))
}

/// Returns the offset just past the closing `>`.
fn skip_hex_string(data: &[u8], start: usize) -> Result<usize, PageError> {
    for (i, &b) in data.iter().enumerate().skip(start + 1) {
        match b {
            b'>' => return Ok(i + 1),
            b if b.is_ascii_hexdigit() || is_whitespace(b) => {}
            _ => return Err(syntax(i, "invalid byte in hex string")),
        }
    }
    Err(syntax(start, "unterminated hex string"))
}

/// Skip an inline image from just after `BI` to just after its `EI`.
fn skip_inline_image(data: &[u8], from: usize) -> Result<usize, PageError> {
    let is_keyword_at = |pos: usize, kw: &[u8]| {
        data[pos..].starts_with(kw)
            && (pos == 0 || is_whitespace(data[pos - 1]))
            && data.get(pos + kw.len()).is_none_or(|&b| is_whitespace(b))
    };

    let Some(data_start) = (from..data.len()).find(|&pos| is_keyword_at(pos, b"ID")) else {
        return Err(syntax(from, "inline image without ID"));
    };
    (data_start + 3..data.len())
        .find(|&pos| is_keyword_at(pos, b"EI"))
        .map(|pos| pos + 2)
        .ok_or_else(|| syntax(from, "unterminated inline image"))
}
