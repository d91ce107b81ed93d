//! Configuration for the four pipeline stages.
//!
//! All behaviour is controlled through [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. One struct serves every stage; each stage
//! reads only the fields it needs, which keeps the stage binaries and the
//! `run-all` orchestrator on the same defaults.

use crate::error::QuizGenError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used by the generative path when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Provider used by the generative path when none is configured.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Heading placed at the top of the assembled document.
pub const DEFAULT_HEADING: &str = "Auto-generated Questions";

/// Configuration shared by every stage.
///
/// # Example
/// ```rust
/// use quizgen::{GenerationMode, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .mode(GenerationMode::Template)
///     .figure_width_inches(3.0)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// How questions are synthesised. Default: [`GenerationMode::Template`].
    pub mode: GenerationMode,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai"). If None, uses [`DEFAULT_PROVIDER`].
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`
    /// and satisfies the credential check on its own.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Credential for the generative path. Required in
    /// [`GenerationMode::Llm`] unless `provider` is set.
    pub api_key: Option<String>,

    /// Sampling temperature for completions. Default: 0.7.
    pub temperature: f32,

    /// Maximum tokens per completion. Default: 700.
    pub max_tokens: usize,

    /// Characters of each block sent to the model. Default: 1200.
    pub prompt_char_limit: usize,

    /// Characters of each block kept by the fallback template. Default: 600.
    pub fallback_char_limit: usize,

    /// TrueType font for diagram text. If None, `QUIZGEN_FONT` and a list
    /// of well-known system fonts are tried.
    pub font_path: Option<PathBuf>,

    /// Display width of embedded figures, in inches. Default: 3.5.
    pub figure_width_inches: f32,

    /// Level-1 heading of the output document.
    pub document_heading: String,

    /// Directory receiving images copied out of the source document.
    /// If None, `media/` next to `parsed.json`.
    pub media_dir: Option<PathBuf>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-question progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: GenerationMode::default(),
            model: None,
            provider_name: None,
            provider: None,
            api_key: None,
            temperature: 0.7,
            max_tokens: 700,
            prompt_char_limit: 1200,
            fallback_char_limit: 600,
            font_path: None,
            figure_width_inches: 3.5,
            document_heading: DEFAULT_HEADING.to_string(),
            media_dir: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("mode", &self.mode)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("prompt_char_limit", &self.prompt_char_limit)
            .field("fallback_char_limit", &self.fallback_char_limit)
            .field("font_path", &self.font_path)
            .field("figure_width_inches", &self.figure_width_inches)
            .field("document_heading", &self.document_heading)
            .field("media_dir", &self.media_dir)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Model name the generative path will request.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Provider name the generative path will use.
    pub fn provider_or_default(&self) -> &str {
        self.provider_name.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    /// True when a usable credential (or a ready provider) is present.
    pub fn has_credential(&self) -> bool {
        self.provider.is_some() || self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Builder for [`PipelineConfig`].
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl fmt::Debug for PipelineConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl PipelineConfigBuilder {
    pub fn mode(mut self, mode: GenerationMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn prompt_char_limit(mut self, n: usize) -> Self {
        self.config.prompt_char_limit = n;
        self
    }

    pub fn fallback_char_limit(mut self, n: usize) -> Self {
        self.config.fallback_char_limit = n;
        self
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.font_path = Some(path.into());
        self
    }

    pub fn figure_width_inches(mut self, inches: f32) -> Self {
        self.config.figure_width_inches = inches;
        self
    }

    pub fn document_heading(mut self, heading: impl Into<String>) -> Self {
        self.config.document_heading = heading.into();
        self
    }

    pub fn media_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.media_dir = Some(dir.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, QuizGenError> {
        let c = &self.config;
        if !(c.figure_width_inches > 0.0 && c.figure_width_inches <= 20.0) {
            return Err(QuizGenError::InvalidConfig(format!(
                "figure width must be in (0, 20] inches, got {}",
                c.figure_width_inches
            )));
        }
        if c.prompt_char_limit == 0 || c.fallback_char_limit == 0 {
            return Err(QuizGenError::InvalidConfig(
                "character limits must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(QuizGenError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the Classifier/Templater produces records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Deterministic keyword-dispatched templates; no network. (default)
    #[default]
    Template,
    /// One chat completion per block via the configured LLM provider.
    Llm,
}
