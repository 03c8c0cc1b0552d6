//! Delegate interface for the optional language-model backend
//!
//! The delegate fills three narrow roles, each with a recognized response
//! schema: strategy classification (one enum value), structured-query
//! generation (raw query text), and free-form answer prose. Every call is
//! wrapped in a bounded timeout at the call site, and a failed or timed-out
//! delegate is always recoverable — callers fall back to rules, templates,
//! or deterministic text.

use async_trait::async_trait;

use crate::errors::{QueryError, Result};
use crate::types::Strategy;

pub mod ollama;
pub use ollama::OllamaDelegate;

/// A prompt-completion backend
#[async_trait]
pub trait Delegate: Send + Sync {
    /// Complete a prompt and return the raw response text
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Prompt for the strategy-enum schema
pub fn classification_prompt(question: &str, recent_turns: &[String]) -> String {
    let context = if recent_turns.is_empty() {
        String::new()
    } else {
        format!("Recent conversation turns:\n{}\n\n", recent_turns.join("\n"))
    };

    format!(
        "You route workforce questions to a retrieval strategy.\n\
         Strategies:\n\
         - sql: structured facts (who, how many, which department, counts, averages)\n\
         - semantic: content of one or more documents (resumes, reviews, briefs)\n\
         - hybrid: needs both structured facts and document content\n\
         - advanced_hybrid: compares two or more named documents against structured facts\n\
         - conversational: greeting or small talk, no data needed\n\
         - unsupported: asks to modify data, or is out of scope\n\n\
         {}Respond with exactly one strategy name and nothing else.\n\n\
         Question: \"{}\"\n\nStrategy:",
        context, question
    )
}

/// Parse the strategy-enum schema: a bare name, or a JSON object carrying one
pub fn parse_strategy(response: &str) -> Result<Strategy> {
    let trimmed = response.trim();

    if let Some(strategy) = Strategy::parse(trimmed) {
        return Ok(strategy);
    }

    // Some backends wrap the answer in JSON despite instructions
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&trimmed[start..=end]) {
            for key in ["strategy", "query_type", "route"] {
                if let Some(name) = value.get(key).and_then(|v| v.as_str()) {
                    if let Some(strategy) = Strategy::parse(name) {
                        return Ok(strategy);
                    }
                }
            }
        }
    }

    Err(QueryError::ClassificationFailed(format!(
        "delegate returned no recognized strategy: {:?}",
        trimmed.chars().take(80).collect::<String>()
    )))
}

/// Prompt for the query-text schema, with optional corrective context from a
/// failed previous attempt
pub fn query_generation_prompt(
    question: &str,
    schema: &str,
    failed: Option<(&str, &str)>,
) -> String {
    let correction = match failed {
        Some((query, error)) => format!(
            "\nYou previously generated this query:\n{}\n\
             It failed with this error:\n{}\n\
             Analyze the error and the schema, then generate a corrected query.\n",
            query, error
        ),
        None => String::new(),
    };

    format!(
        "You convert natural-language questions into a single read-only SQL query.\n\
         Output ONLY the raw query. No explanations, comments, or markdown.\n\n\
         Database schema:\n{}\n{}\n\
         Question: {}\n\nSQL Query:",
        schema, correction, question
    )
}

/// Parse the query-text schema: strip markdown fences and surrounding noise
pub fn parse_query_text(response: &str) -> String {
    response
        .trim()
        .trim_start_matches("```sql")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
        .to_string()
}

/// Prompt for the free-form answer schema
pub fn prose_prompt(question: &str, draft: &str) -> String {
    format!(
        "You are a talent analytics expert. Restate the findings below as a \
         single well-structured answer to the question. Keep every citation \
         marker exactly as written; do not invent facts beyond the findings.\n\n\
         Question: {}\n\nFindings:\n{}\n\nAnswer:",
        question, draft
    )
}
