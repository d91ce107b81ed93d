//! `run-all`: the four stages in sequence, with skip-if-exists and a summary.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use quizgen::artifact::{
    ensure_dir, load_json, remove_stale_output, DEFAULT_IMAGES_DIR, DEFAULT_INPUT,
    DEFAULT_PARSED, DEFAULT_QUESTIONS, DEFAULT_RESULT,
};
use quizgen::cli::{bold, confirm, cyan, green, red, yellow, OutputArgs};
use quizgen::{
    build_document, generate_images, generate_questions, parse_document, run_sync,
    GenerationMode, ParsedDocument, PipelineConfig, QuestionSet,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Parse, generate, illustrate and assemble in one go.
#[derive(Parser, Debug)]
#[command(name = "run-all", version, about)]
struct Cli {
    /// Source .docx (path or URL).
    #[arg(long, default_value = DEFAULT_INPUT)]
    input: String,

    #[arg(long, default_value = DEFAULT_PARSED)]
    parsed: PathBuf,

    #[arg(long, default_value = DEFAULT_QUESTIONS)]
    questions: PathBuf,

    #[arg(long, default_value = DEFAULT_IMAGES_DIR)]
    images: PathBuf,

    /// Final document.
    #[arg(short, long, default_value = DEFAULT_RESULT)]
    out: PathBuf,

    #[arg(long, value_enum, default_value = "template")]
    mode: ModeArg,

    /// API key for --mode llm.
    #[arg(long, alias = "api-key", env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_key: Option<String>,

    #[arg(long, env = "QUIZGEN_MODEL")]
    model: Option<String>,

    #[arg(long, env = "QUIZGEN_PROVIDER")]
    provider: Option<String>,

    /// TrueType font for diagram text.
    #[arg(long, env = "QUIZGEN_FONT")]
    font: Option<PathBuf>,

    /// Skip stages whose output already exists, without asking.
    #[arg(short = 'y', long, conflicts_with = "no_skip")]
    yes: bool,

    /// Always re-run every stage, without asking.
    #[arg(long)]
    no_skip: bool,

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

/// What to do when a stage's output already exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SkipPolicy {
    Ask,
    Always,
    Never,
}

impl SkipPolicy {
    fn should_skip(self, existing: &Path, description: &str) -> bool {
        if !existing.exists() {
            return false;
        }
        match self {
            SkipPolicy::Always => true,
            SkipPolicy::Never => false,
            SkipPolicy::Ask => confirm(&format!(
                "⚠ {} already exists. Skip {}?",
                existing.display(),
                description
            )),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.output.init_logging();

    let policy = if cli.yes {
        SkipPolicy::Always
    } else if cli.no_skip {
        SkipPolicy::Never
    } else {
        SkipPolicy::Ask
    };
    let config = build_config(&cli)?;

    // Step 1: parse
    let description = "Parsing source document";
    if policy.should_skip(&cli.parsed, description) {
        skipped(description);
    } else {
        step(description, || {
            run_sync(parse_document(&cli.input, &cli.parsed, &config)).map(|_| ())
        })?;
    }

    // Step 2: generate
    let description = match config.mode {
        GenerationMode::Template => "Generating questions (template mode)",
        GenerationMode::Llm => "Generating questions (llm mode)",
    };
    if policy.should_skip(&cli.questions, description) {
        skipped(description);
    } else {
        step(description, || {
            run_sync(generate_questions(&cli.parsed, &cli.questions, &config)).map(|_| ())
        })?;
    }

    // Step 3: images, always re-run
    ensure_dir(&cli.images)?;
    step("Generating images", || {
        generate_images(&cli.questions, &cli.images, &config).map(|_| ())
    })?;

    // Step 4: document
    if remove_stale_output(&cli.out).map_err(|e| {
        eprintln!("{}", red(&format!("✖ {e}")));
        e
    })? {
        eprintln!("{}", yellow(&format!("⚠ Removed old file: {}", cli.out.display())));
    }
    step("Building final document", || {
        build_document(&cli.questions, Some(&cli.images), &cli.out, &config).map(|_| ())
    })?;

    summary(&cli);
    Ok(())
}

fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder().mode(cli.mode.into());
    if let Some(ref key) = cli.openai_key {
        builder = builder.api_key(key);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref font) = cli.font {
        builder = builder.font_path(font);
    }
    if let Some(cb) = cli.output.progress_callback() {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

/// Run one stage with timing; any error stops the run.
fn step<F>(description: &str, f: F) -> Result<()>
where
    F: FnOnce() -> Result<(), quizgen::QuizGenError>,
{
    eprintln!("{}", cyan(&format!("▶ Starting: {description}")));
    let start = Instant::now();
    match f() {
        Ok(()) => {
            eprintln!(
                "{}",
                green(&format!(
                    "✔ Completed: {description} in {:.2}s",
                    start.elapsed().as_secs_f64()
                ))
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", red(&format!("✖ Error during: {description}")));
            Err(e).with_context(|| description.to_string())
        }
    }
}

fn skipped(description: &str) {
    eprintln!("{}", cyan(&format!("⏭ Skipped: {description}")));
}

fn summary(cli: &Cli) {
    eprintln!("\n{}", green("====== SUMMARY ======"));
    if let Ok(parsed) = load_json::<ParsedDocument>(&cli.parsed) {
        eprintln!("{} {}", cyan("Parsed Questions:"), parsed.question_blocks.len());
    }
    if let Ok(set) = load_json::<QuestionSet>(&cli.questions) {
        eprintln!("{} {}", cyan("Generated Questions:"), set.len());
    }
    if cli.images.is_dir() {
        eprintln!("{} {}", cyan("Generated Images:"), count_images(&cli.images));
    }
    if cli.out.exists() {
        eprintln!("{} {}", cyan("Final Document:"), bold(&cli.out.display().to_string()));
    }
    eprintln!("{}\n", green("====================="));
}

fn count_images(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| {
                    let name = e.file_name().to_string_lossy().to_lowercase();
                    name.ends_with(".png") || name.ends_with(".jpg") || name.ends_with(".jpeg")
                })
                .count()
        })
        .unwrap_or(0)
}
