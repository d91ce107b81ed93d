//! Stage entry points: one function per pipeline step, artifact in, artifact out.
//!
//! Each function reads the previous stage's file, runs one transformation
//! from [`crate::pipeline`] and writes its own artifact before returning the
//! in-memory value. The stage binaries and `run-all` are thin wrappers over
//! these.
//!
//! Only [`parse_document`] (URL download) and [`generate_questions`] (chat
//! completion) are async; the image and document stages are plain
//! functions.

use crate::artifact::{ensure_parent, load_json, save_json};
use crate::config::{GenerationMode, PipelineConfig};
use crate::error::QuizGenError;
use crate::model::{ImageManifest, ParsedDocument, QuestionSet};
use crate::pipeline::assemble::{assemble, AssemblyStats};
use crate::pipeline::{classify, extract, illustrate, input, llm};
use crate::progress::Stage;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Extract text, question blocks and media from a .docx file or URL.
///
/// Media goes to `config.media_dir`, or a `media/` directory next to
/// `out_json` when unset.
///
/// # Errors
/// - Missing, unreadable or non-docx input
/// - Download failure for URL input
/// - Unwritable `out_json`
///
/// Media extraction problems are logged and never returned.
pub async fn parse_document(
    input_str: impl AsRef<str>,
    out_json: &Path,
    config: &PipelineConfig,
) -> Result<ParsedDocument, QuizGenError> {
    let start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Parsing {}", input_str);

    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(Stage::Extract, 1);
    }

    let source = input::locate(input_str, config.download_timeout_secs).await?;
    let media_dir = config
        .media_dir
        .clone()
        .unwrap_or_else(|| default_media_dir(out_json));
    let parsed = extract::extract_document(source.path(), &media_dir)?;

    ensure_parent(out_json)?;
    save_json(&parsed, out_json)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(Stage::Extract, 1);
    }
    info!(
        "Saved parsed output to {} ({} questions) in {:?}",
        out_json.display(),
        parsed.question_blocks.len(),
        start.elapsed()
    );
    Ok(parsed)
}

/// Synthesize one record per question block of `parsed_json`.
///
/// [`GenerationMode::Template`] never touches the network.
/// [`GenerationMode::Llm`] fails with [`QuizGenError::MissingCredential`]
/// before any request when no credential is configured.
pub async fn generate_questions(
    parsed_json: &Path,
    out_json: &Path,
    config: &PipelineConfig,
) -> Result<QuestionSet, QuizGenError> {
    let parsed: ParsedDocument = load_json(parsed_json)?;
    let blocks = &parsed.question_blocks;
    info!("Generating {} questions ({:?} mode)", blocks.len(), config.mode);

    let questions = match config.mode {
        GenerationMode::Template => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_start(Stage::Generate, blocks.len());
            }
            let set = classify::classify_and_template(blocks, config.fallback_char_limit);
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_complete(Stage::Generate, set.len());
            }
            set
        }
        GenerationMode::Llm => llm::generate_with_llm(blocks, config).await?,
    };

    ensure_parent(out_json)?;
    save_json(&questions, out_json)?;
    info!("Saved {} generated questions to {}", questions.len(), out_json.display());
    Ok(questions)
}

/// Draw one diagram per record of `questions_json` into `out_dir`.
pub fn generate_images(
    questions_json: &Path,
    out_dir: &Path,
    config: &PipelineConfig,
) -> Result<ImageManifest, QuizGenError> {
    let questions: QuestionSet = load_json(questions_json)?;
    illustrate::illustrate(&questions, out_dir, config)
}

/// Write the output document for `questions_json`.
///
/// An existing `out_docx` is overwritten; callers wanting a clear
/// "file is open elsewhere" error should run
/// [`crate::artifact::remove_stale_output`] first.
pub fn build_document(
    questions_json: &Path,
    images_dir: Option<&Path>,
    out_docx: &Path,
    config: &PipelineConfig,
) -> Result<AssemblyStats, QuizGenError> {
    let questions: QuestionSet = load_json(questions_json)?;
    assemble(&questions, images_dir, out_docx, config)
}

/// Run an async stage to completion on a temporary tokio runtime.
pub fn run_sync<F, T>(fut: F) -> Result<T, QuizGenError>
where
    F: Future<Output = Result<T, QuizGenError>>,
{
    tokio::runtime::Runtime::new()
        .map_err(|e| QuizGenError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(fut)
}

fn default_media_dir(out_json: &Path) -> PathBuf {
    out_json
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join("media")
}
