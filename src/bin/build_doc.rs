//! `build-doc`: assemble questions.json (and images) into the output .docx.

use anyhow::{Context, Result};
use clap::Parser;
use quizgen::artifact::remove_stale_output;
use quizgen::cli::{bold, green, yellow, OutputArgs};
use quizgen::config::DEFAULT_HEADING;
use quizgen::{build_document, PipelineConfig};
use std::path::PathBuf;

/// Write every question as a tagged-line block, one per page.
#[derive(Parser, Debug)]
#[command(name = "build-doc", version, about, arg_required_else_help = true)]
struct Cli {
    /// questions.json written by gen-questions.
    #[arg(short, long)]
    input: PathBuf,

    /// Image directory written by gen-images.
    #[arg(long)]
    images: Option<PathBuf>,

    /// Output .docx path (replaced if present).
    #[arg(short, long)]
    out: PathBuf,

    /// Top-level heading of the document.
    #[arg(long, default_value = DEFAULT_HEADING)]
    heading: String,

    /// Display width of each figure, in inches.
    #[arg(long, default_value_t = 3.5)]
    figure_width: f32,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.output.init_logging();

    let mut builder = PipelineConfig::builder()
        .document_heading(&cli.heading)
        .figure_width_inches(cli.figure_width);
    if let Some(cb) = cli.output.progress_callback() {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    if remove_stale_output(&cli.out)? && !cli.output.quiet {
        eprintln!("{}", yellow(&format!("⚠ Removed old file: {}", cli.out.display())));
    }

    let stats = build_document(&cli.input, cli.images.as_deref(), &cli.out, &config)
        .context("Document assembly failed")?;

    if !cli.output.quiet {
        eprintln!(
            "{} {} questions, {} figures  →  {}",
            green("✔"),
            stats.records,
            stats.images_embedded,
            bold(&cli.out.display().to_string()),
        );
    }
    Ok(())
}
