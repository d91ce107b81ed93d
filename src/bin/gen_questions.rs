//! `gen-questions`: turn parsed.json into questions.json.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use quizgen::cli::{bold, green, OutputArgs};
use quizgen::{generate_questions, run_sync, GenerationMode, PipelineConfig};
use std::path::PathBuf;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Offline, deterministic templates
  gen-questions --input output/parsed.json --out output/questions.json

  # One chat completion per question block
  gen-questions --mode llm --openai-key sk-... --input output/parsed.json --out output/questions.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY     Credential for --mode llm
  QUIZGEN_MODEL      Override model ID (default gpt-4o-mini)
  QUIZGEN_PROVIDER   Override provider (default openai)
"#;

/// Generate multiple-choice question records from parsed question blocks.
#[derive(Parser, Debug)]
#[command(
    name = "gen-questions",
    version,
    about,
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// parsed.json written by parse-doc.
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write questions.json.
    #[arg(short, long)]
    out: PathBuf,

    /// template: keyword templates, offline. llm: chat model per block.
    #[arg(long, value_enum, default_value = "template")]
    mode: ModeArg,

    /// API key for --mode llm.
    #[arg(long, alias = "api-key", env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_key: Option<String>,

    /// LLM model ID.
    #[arg(long, env = "QUIZGEN_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "QUIZGEN_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens per question.
    #[arg(long, default_value_t = 700)]
    max_tokens: usize,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Template,
    Llm,
}

impl From<ModeArg> for GenerationMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Template => GenerationMode::Template,
            ModeArg::Llm => GenerationMode::Llm,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.output.init_logging();

    let mut builder = PipelineConfig::builder()
        .mode(cli.mode.into())
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens);
    if let Some(ref key) = cli.openai_key {
        builder = builder.api_key(key);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(cb) = cli.output.progress_callback() {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let set = run_sync(generate_questions(&cli.input, &cli.out, &config))
        .context("Question generation failed")?;

    if !cli.output.quiet {
        eprintln!(
            "{} {} questions  →  {}",
            green("✔"),
            set.len(),
            bold(&cli.out.display().to_string()),
        );
    }
    Ok(())
}
