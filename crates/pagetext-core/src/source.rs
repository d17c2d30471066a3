//! Byte sources: a file-system path or an in-memory buffer.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{ParseError, Result};

/// Where the document bytes come from.
#[derive(Debug, Clone)]
pub enum ByteSource {
    /// A file on the local file system.
    Path(PathBuf),
    /// Bytes already in memory, e.g. an uploaded file.
    Bytes(Vec<u8>),
}

impl ByteSource {
    /// Read the whole source into memory.
    pub fn read(self) -> Result<Vec<u8>> {
        match self {
            ByteSource::Path(path) => {
                let meta = fs::metadata(&path).map_err(|e| {
                    if e.kind() == io::ErrorKind::NotFound {
                        io::Error::new(
                            io::ErrorKind::NotFound,
                            format!("PDF file not found: {}", path.display()),
                        )
                    } else {
                        e
                    }
                })?;
                if !meta.is_file() {
                    return Err(ParseError::NotAFile(path));
                }
                let data = fs::read(&path)?;
                debug!("Read {} bytes from {}", data.len(), path.display());
                Ok(data)
            }
            ByteSource::Bytes(data) => Ok(data),
        }
    }
}

impl From<Vec<u8>> for ByteSource {
    fn from(data: Vec<u8>) -> Self {
        ByteSource::Bytes(data)
    }
}

impl From<PathBuf> for ByteSource {
    fn from(path: PathBuf) -> Self {
        ByteSource::Path(path)
    }
}
