//! CLI application for page-indexed PDF text extraction.

mod commands;
mod server;

#[cfg(test)]
#[path = "../../pagetext-core/tests/common/mod.rs"]
mod fixtures;

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{parse, serve};

/// Extract page-indexed text, metadata and scan warnings from PDF files
#[derive(Parser)]
#[command(name = "pagetext")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(required_unless_present_any = ["serve", "show_config"])]
    input: Option<PathBuf>,

    /// Return metadata and warnings only, without per-page text
    #[arg(long)]
    no_pages: bool,

    /// Start the HTTP server instead of parsing a file
    #[arg(long, conflicts_with = "input")]
    serve: bool,

    /// Address the HTTP server listens on
    #[arg(long, env = "PAGETEXT_BIND")]
    bind: Option<String>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,

    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only JSON
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = commands::load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if cli.no_pages {
        config.parse.include_pages = false;
    }

    if cli.show_config {
        return commands::show_config(&config);
    }

    if cli.serve {
        return serve::run(config).await;
    }

    let Some(input) = cli.input else {
        anyhow::bail!("No input file given");
    };

    parse::run(
        parse::ParseArgs {
            input,
            output: cli.output,
            compact: cli.compact,
        },
        config.parse,
    )
    .await
}
