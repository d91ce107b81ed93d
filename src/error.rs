//! Error types for the quizgen library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`QuizGenError`]: **Fatal**: the stage cannot proceed at all (missing
//!   input, malformed model output, locked output file, missing
//!   credential). Returned as `Err(QuizGenError)` from every stage entry
//!   point; the run stops at the first one.
//!
//! * [`MediaError`]: **Non-fatal**: copying an embedded image out of the
//!   source document failed. The Extractor logs it and carries on with
//!   whatever images it did get, possibly none.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the quizgen library.
#[derive(Debug, Error)]
pub enum QuizGenError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists but is not a ZIP package with a Word document part.
    #[error("File is not a valid .docx document: '{path}'\n{reason}")]
    NotADocx { path: PathBuf, reason: String },

    /// The package opened but its document part could not be parsed.
    #[error("Document '{path}' is corrupt: {detail}")]
    CorruptDocument { path: PathBuf, detail: String },

    // ── Generation errors ─────────────────────────────────────────────────
    /// Generative mode was selected but no credential was supplied.
    #[error(
        "No API key supplied for provider '{provider}'.\n\
Pass --openai-key or set OPENAI_API_KEY, or use --mode template."
    )]
    MissingCredential { provider: String },

    /// The configured provider could not be created.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The completion API returned an error.
    #[error("LLM API error on question {order}: {message}")]
    LlmApiError { order: u32, message: String },

    /// The model reply was neither JSON nor contained a recoverable JSON object.
    #[error("Model reply for question {order} is not a valid question record: {detail}\nReply starts with: {excerpt:?}")]
    MalformedLlmOutput {
        order: u32,
        detail: String,
        excerpt: String,
    },

    // ── Artifact errors ───────────────────────────────────────────────────
    /// An intermediate artifact (parsed.json, questions.json, ...) could not be read.
    #[error("Failed to read '{path}': {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An intermediate artifact is not valid JSON for its schema.
    #[error("Failed to parse '{path}': {source}")]
    ArtifactParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output document could not be packaged.
    #[error("Failed to write document '{path}': {detail}")]
    DocumentWriteFailed { path: PathBuf, detail: String },

    /// A generated diagram could not be encoded or saved.
    #[error("Failed to save image '{path}': {detail}")]
    ImageWriteFailed { path: PathBuf, detail: String },

    /// The previous output document is held open by another process.
    #[error("Please close the file before running again: '{path}'")]
    OutputLocked { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error while copying embedded media out of the source document.
#[derive(Debug, Clone, Error)]
pub enum MediaError {
    /// The package could not be opened as a ZIP archive.
    #[error("could not open '{path}' as an archive: {detail}")]
    ArchiveUnreadable { path: PathBuf, detail: String },

    /// One media entry could not be read or written.
    #[error("could not extract media entry '{name}': {detail}")]
    EntryFailed { name: String, detail: String },

    /// The media output directory could not be created.
    #[error("could not create media directory '{path}': {detail}")]
    OutputDir { path: PathBuf, detail: String },
}
