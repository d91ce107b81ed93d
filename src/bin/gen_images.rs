//! `gen-images`: draw one diagram per question in questions.json.

use anyhow::{Context, Result};
use clap::Parser;
use quizgen::cli::{bold, green, OutputArgs};
use quizgen::{generate_images, PipelineConfig};
use std::path::PathBuf;

/// Render table, circle-packing or banner PNGs for each question.
#[derive(Parser, Debug)]
#[command(name = "gen-images", version, about, arg_required_else_help = true)]
struct Cli {
    /// questions.json written by gen-questions.
    #[arg(short, long)]
    input: PathBuf,

    /// Output image directory (created if missing).
    #[arg(short, long)]
    out: PathBuf,

    /// TrueType font for diagram text.
    #[arg(long, env = "QUIZGEN_FONT")]
    font: Option<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.output.init_logging();

    let mut builder = PipelineConfig::builder();
    if let Some(ref font) = cli.font {
        builder = builder.font_path(font);
    }
    if let Some(cb) = cli.output.progress_callback() {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let manifest =
        generate_images(&cli.input, &cli.out, &config).context("Image generation failed")?;

    if !cli.output.quiet {
        eprintln!(
            "{} {} images  →  {}",
            green("✔"),
            manifest.images.len(),
            bold(&cli.out.display().to_string()),
        );
    }
    Ok(())
}
