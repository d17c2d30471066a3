//! Configuration structures for the parsing pipeline and its front ends.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for pagetext.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagetextConfig {
    /// Parse options applied when the caller does not override them.
    pub parse: ParseOptions,

    /// HTTP server configuration.
    pub server: ServerConfig,
}

/// Options for a single parse call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Return per-page text. When false, pages are still extracted so that
    /// warnings stay accurate, but the page records are dropped.
    pub include_pages: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            include_pages: true,
        }
    }
}

impl ParseOptions {
    /// Options for metadata + warnings only output.
    pub fn metadata_only() -> Self {
        Self {
            include_pages: false,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,

    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,

    /// Reject uploads whose filename does not end in `.pdf`.
    pub require_pdf_extension: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
            require_pdf_extension: true,
        }
    }
}

impl PagetextConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Default location of the user configuration file, if the platform has
    /// a config directory.
    pub fn default_path(config_dir: Option<PathBuf>) -> Option<PathBuf> {
        config_dir.map(|dir| dir.join("pagetext").join("config.json"))
    }
}
