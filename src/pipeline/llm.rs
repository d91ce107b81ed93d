//! Generative question path: one chat completion per source block.
//!
//! Blocks are sent one at a time, in order, with no retries; the first
//! failure ends the stage. The reply must be a JSON object with the
//! [`QuestionRecord`] field set. Models often wrap it in prose or a code
//! fence, so a reply that does not parse directly gets a second chance:
//! the text between the first `{` and the last `}` is parsed instead. Once
//! an object is found its fields are coerced, never rejected.

use crate::config::PipelineConfig;
use crate::error::QuizGenError;
use crate::model::{QuestionRecord, QuestionSet};
use crate::progress::Stage;
use crate::prompts::question_prompt;
use edgequake_llm::{
    AnthropicProvider, ChatMessage, CompletionOptions, LLMProvider, OpenAIProvider,
    ProviderFactory, ProviderType,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Generate one record per block through the configured provider.
pub async fn generate_with_llm(
    blocks: &[String],
    config: &PipelineConfig,
) -> Result<QuestionSet, QuizGenError> {
    let provider = resolve_provider(config)?;
    let options = build_options(config);
    let total = blocks.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(Stage::Generate, total);
    }

    let mut questions = Vec::with_capacity(total);
    for (i, block) in blocks.iter().enumerate() {
        let order = i as u32 + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_item_start(Stage::Generate, order, total);
        }

        let result = generate_one(&provider, block, order, &options, config).await;
        match result {
            Ok(record) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_item_complete(Stage::Generate, order, total);
                }
                questions.push(record);
            }
            Err(e) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_item_error(Stage::Generate, order, total, &e.to_string());
                }
                return Err(e);
            }
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(Stage::Generate, total);
    }
    info!(
        "Generated {} questions with {}",
        questions.len(),
        config.model_or_default()
    );
    Ok(QuestionSet { questions })
}

async fn generate_one(
    provider: &Arc<dyn LLMProvider>,
    block: &str,
    order: u32,
    options: &CompletionOptions,
    config: &PipelineConfig,
) -> Result<QuestionRecord, QuizGenError> {
    let start = Instant::now();
    let messages = vec![ChatMessage::user(question_prompt(block, config.prompt_char_limit))];

    let response = provider
        .chat(&messages, Some(options))
        .await
        .map_err(|e| QuizGenError::LlmApiError {
            order,
            message: e.to_string(),
        })?;

    debug!(
        "Question {}: {} input tokens, {} output tokens, {:?}",
        order,
        response.prompt_tokens,
        response.completion_tokens,
        start.elapsed()
    );

    parse_record_reply(&response.content, order)
}

/// Decode a model reply into a record and stamp it with `order`.
///
/// Only a reply with no JSON object in it is malformed. Field types are
/// coerced by [`QuestionRecord::from_json_object`].
pub fn parse_record_reply(reply: &str, order: u32) -> Result<QuestionRecord, QuizGenError> {
    let object = match serde_json::from_str::<Value>(reply.trim()) {
        Ok(Value::Object(map)) => map,
        direct => {
            let salvaged = salvage_json_object(reply)
                .ok_or_else(|| malformed(reply, order, direct_failure(&direct)))?;
            warn!("Question {}: reply was not bare JSON, salvaged embedded object", order);
            match serde_json::from_str::<Value>(salvaged) {
                Ok(Value::Object(map)) => map,
                Ok(_) => return Err(malformed(reply, order, "embedded JSON is not an object".into())),
                Err(e) => return Err(malformed(reply, order, e.to_string())),
            }
        }
    };
    let mut record = QuestionRecord::from_json_object(&object);
    record.order = order;
    Ok(record)
}

fn direct_failure(result: &Result<Value, serde_json::Error>) -> String {
    match result {
        Ok(_) => "reply is JSON but not an object".to_string(),
        Err(e) => e.to_string(),
    }
}

/// Slice from the first `{` to the last `}`, if both exist in that order.
pub fn salvage_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn malformed(reply: &str, order: u32, detail: String) -> QuizGenError {
    QuizGenError::MalformedLlmOutput {
        order,
        detail,
        excerpt: reply.chars().take(120).collect(),
    }
}

/// Resolve the provider, checking the credential before anything is built.
///
/// 1. A pre-built provider in the config is used as-is.
/// 2. Otherwise a credential must be present. OpenAI and Anthropic are
///    built directly from the configured key.
/// 3. Any other provider goes through [`ProviderFactory::create_llm_provider`],
///    which reads that provider's key variable from the environment.
pub fn resolve_provider(config: &PipelineConfig) -> Result<Arc<dyn LLMProvider>, QuizGenError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let name = config.provider_or_default();
    if !config.has_credential() {
        return Err(QuizGenError::MissingCredential {
            provider: name.to_string(),
        });
    }

    let model = config.model_or_default();
    if let Some(key) = config.api_key.as_deref().map(str::trim) {
        match ProviderType::from_str(name) {
            Some(ProviderType::OpenAI) => {
                return Ok(Arc::new(OpenAIProvider::new(key).with_model(model)));
            }
            Some(ProviderType::Anthropic) => {
                return Ok(Arc::new(AnthropicProvider::new(key).with_model(model)));
            }
            _ => debug!("Provider '{}' reads its key from the environment", name),
        }
    }

    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        QuizGenError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Build `CompletionOptions` from the pipeline config.
fn build_options(config: &PipelineConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
