//! Parse command - extract text and metadata from a single PDF file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use console::style;
use tracing::{debug, info, warn};

use pagetext_core::{parse_path, ParseOptions, ParseResult};

/// Arguments for the parse command.
pub struct ParseArgs {
    /// Input PDF file.
    pub input: PathBuf,
    /// Output file (default: stdout).
    pub output: Option<PathBuf>,
    /// Print single-line JSON.
    pub compact: bool,
}

pub async fn run(args: ParseArgs, options: ParseOptions) -> anyhow::Result<()> {
    let start = Instant::now();
    info!("Processing file: {}", args.input.display());

    let input = args.input.clone();
    let result = tokio::task::spawn_blocking(move || parse_path(&input, &options))
        .await?
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;

    for warning in result.warnings() {
        warn!("{}", warning);
    }

    let output = render(&result, args.compact)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, format!("{}\n", output))
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Finished in {}ms", start.elapsed().as_millis());
    Ok(())
}

/// Serialize a result as pretty or compact JSON.
pub fn render(result: &ParseResult, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(result)
    } else {
        serde_json::to_string_pretty(result)
    }
}
