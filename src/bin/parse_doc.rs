//! `parse-doc`: extract paragraph text, question blocks and media from a .docx.

use anyhow::{Context, Result};
use clap::Parser;
use quizgen::cli::{bold, green, OutputArgs};
use quizgen::{parse_document, PipelineConfig};
use std::path::PathBuf;

/// Parse a .docx of questions into parsed.json.
#[derive(Parser, Debug)]
#[command(name = "parse-doc", version, about, arg_required_else_help = true)]
struct Cli {
    /// Local .docx path or HTTP/HTTPS URL.
    #[arg(short, long)]
    input: String,

    /// Where to write parsed.json.
    #[arg(short, long)]
    out: PathBuf,

    /// Directory for embedded images (default: `media/` next to --out).
    #[arg(long, env = "QUIZGEN_MEDIA_DIR")]
    media_dir: Option<PathBuf>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "QUIZGEN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    #[command(flatten)]
    output: OutputArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.output.init_logging();

    let mut builder = PipelineConfig::builder().download_timeout_secs(cli.download_timeout);
    if let Some(ref dir) = cli.media_dir {
        builder = builder.media_dir(dir);
    }
    let config = builder.build().context("Invalid configuration")?;

    let parsed = parse_document(&cli.input, &cli.out, &config)
        .await
        .with_context(|| format!("Failed to parse {}", cli.input))?;

    if !cli.output.quiet {
        eprintln!(
            "{} {} questions, {} images  →  {}",
            green("✔"),
            parsed.question_blocks.len(),
            parsed.extracted_images.len(),
            bold(&cli.out.display().to_string()),
        );
    }
    Ok(())
}
