//! # quizgen
//!
//! Turn a .docx of math word problems into a new .docx of similar
//! multiple-choice questions, each with a generated diagram.
//!
//! ## Pipeline Overview
//!
//! ```text
//! base_questions.docx
//!  │
//!  ├─ 1. Extract     paragraphs + embedded media      → parsed.json
//!  ├─ 2. Generate    keyword templates or chat model  → questions.json
//!  ├─ 3. Illustrate  table / balls / banner PNGs      → images/ + images.json
//!  └─ 4. Assemble    tagged-line blocks + figures     → result.docx
//! ```
//!
//! Every stage reads the previous stage's file and writes its own, so any
//! stage can be re-run alone. Template mode is fully offline and
//! deterministic; only LLM mode and URL input touch the network.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quizgen::{build_document, generate_images, generate_questions, parse_document, PipelineConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::default();
//!     parse_document("input/base_questions.docx", Path::new("output/parsed.json"), &config).await?;
//!     generate_questions(Path::new("output/parsed.json"), Path::new("output/questions.json"), &config).await?;
//!     generate_images(Path::new("output/questions.json"), Path::new("output/images"), &config)?;
//!     build_document(
//!         Path::new("output/questions.json"),
//!         Some(Path::new("output/images")),
//!         Path::new("output/result.docx"),
//!         &config,
//!     )?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the stage binaries and `run-all` (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! quizgen = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifact;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stages;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationMode, PipelineConfig, PipelineConfigBuilder};
pub use error::{MediaError, QuizGenError};
pub use model::{
    DiagramKind, Difficulty, ImageArtifact, ImageManifest, ParsedDocument, QuestionRecord,
    QuestionSet,
};
pub use pipeline::assemble::AssemblyStats;
pub use progress::{NoopProgressCallback, ProgressCallback, Stage, StageProgressCallback};
pub use stages::{build_document, generate_images, generate_questions, parse_document, run_sync};
