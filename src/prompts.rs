//! Prompts for the generative question path.
//!
//! Kept in one place so the wording can change without touching the call
//! or parsing logic in [`crate::pipeline::llm`], and so tests can inspect
//! the exact text sent to the model.

/// Field list the model must return, in record order.
pub const RECORD_FIELDS: &str = r#"{"title","description","question","instruction","difficulty","order","options","correct_answer","explanation","subject","unit","topic","plusmarks"}"#;

/// Build the single user message for one source block.
///
/// The block is cut to `char_limit` characters on a char boundary.
pub fn question_prompt(block: &str, char_limit: usize) -> String {
    let base: String = block.chars().take(char_limit).collect();
    format!(
        "You are a helpful question-writer. Produce ONE new multiple-choice math question \
that is similar to this base problem while preserving any LaTeX math using $...$ or $$...$$. \
Also produce 4 options and mark which is correct. Output strictly as JSON with fields:\n\
{RECORD_FIELDS}\n\
Base problem (do not include original in output):\n\
{base}"
    )
}
