//! Error types for the pagetext-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that abort a whole parse call.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The bytes are not a parsable PDF (bad header, broken trailer,
    /// unresolvable object graph or page tree).
    #[error("invalid or corrupted PDF: {0}")]
    Structural(String),

    /// The document is encrypted and no credentials are supplied.
    #[error("PDF is encrypted and cannot be read without a password")]
    Encrypted,

    /// The byte source could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path source names something that is not a regular file.
    #[error("path is not a file: {}", .0.display())]
    NotAFile(PathBuf),
}

impl ParseError {
    pub(crate) fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }
}

impl From<lopdf::Error> for ParseError {
    fn from(err: lopdf::Error) -> Self {
        Self::Structural(err.to_string())
    }
}

/// Reason a single page's text could not be recovered.
///
/// Never fatal: the page degrades to empty text and a warning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// The page's `/Contents` entry points at something that is not a stream.
    #[error("unreadable /Contents entry: {0}")]
    Contents(String),

    /// A content stream filter could not be decoded.
    #[error("failed to decode content stream: {0}")]
    Decode(String),

    /// The content stream operators could not be tokenized.
    #[error("malformed content stream: {0}")]
    Syntax(String),
}

/// Result type for the pagetext-core library.
pub type Result<T> = std::result::Result<T, ParseError>;
