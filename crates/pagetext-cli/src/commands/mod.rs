//! Command implementations.

pub mod parse;
pub mod serve;

use std::path::Path;

use anyhow::Context;
use tracing::debug;

use pagetext_core::PagetextConfig;

/// Load configuration from an explicit file, the user config file, or defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PagetextConfig> {
    if let Some(path) = path {
        return PagetextConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    match PagetextConfig::default_path(dirs::config_dir()) {
        Some(path) if path.is_file() => {
            debug!("Using config file {}", path.display());
            PagetextConfig::from_file(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        _ => Ok(PagetextConfig::default()),
    }
}

/// Print the effective configuration as JSON.
pub fn show_config(config: &PagetextConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
