use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_MAX_DISTANCE;

#[derive(Debug, Parser)]
#[command(
    name = "wordtrace",
    about = "Index scanned documents and find words by fuzzy match"
)]
pub struct Cli {
    /// Override the data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// OCR documents and index every word with its location
    Ingest(IngestArgs),
    /// Search indexed words within an edit-distance bound
    Search(SearchArgs),
    /// Draw highlight boxes for recorded search results
    Annotate(AnnotateArgs),
    /// Show session and index statistics
    Status,
    /// Check availability of external tools
    Tools,
}

#[derive(Debug, clap::Args)]
pub struct IngestArgs {
    /// Files or directories to ingest
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Start a fresh session, wiping the current index first
    #[arg(long)]
    pub fresh: bool,

    /// Rasterization DPI for PDF pages
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Pages per processing batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Tesseract language
    #[arg(long)]
    pub lang: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct SearchArgs {
    /// Word to search for
    pub term: String,

    /// Maximum edit distance for a match
    #[arg(long, default_value_t = DEFAULT_MAX_DISTANCE)]
    pub max_distance: u32,
}

#[derive(Debug, clap::Args)]
pub struct AnnotateArgs {
    /// Output directory for annotated pages (defaults to the data dir)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Rendering DPI for regenerated PDF pages
    #[arg(long)]
    pub dpi: Option<u32>,
}
