//! Core library for page-indexed PDF text extraction.
//!
//! This crate provides:
//! - PDF loading with page tree resolution (lopdf)
//! - Info dictionary metadata extraction
//! - Per-page text extraction with page-scoped failure tolerance
//! - Detection of scanned/image-only documents

pub mod error;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod scan;
pub mod source;

pub use error::{PageError, ParseError, Result};
pub use models::config::{PagetextConfig, ParseOptions, ServerConfig};
pub use models::result::{Metadata, PageRecord, ParseResult, Warning, SCANNED_WARNING};
pub use pdf::{LoadedDocument, PageExtraction, PageSource};
pub use pipeline::{assemble, parse, parse_bytes, parse_path};
pub use source::ByteSource;
