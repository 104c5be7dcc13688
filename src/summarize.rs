//! Topic summarization
//!
//! Sends one channel's collected messages to a completion service and
//! reconciles the reply, which may hold several choices, into a single
//! ordered topic list. Unlike collection, failures here are returned to the
//! caller: there is no meaningful partial summary.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::ChatCompletionMessage;
use regex::Regex;
use serde::Deserialize;
use tracing::info;

use crate::ai::prompt_builder::build_prompt;
use crate::core::config::PipelineConfig;
use crate::core::models::{Message, TopicSummary};
use crate::errors::RecapError;

/// One single-shot completion request.
#[derive(Debug)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f64,
    pub messages: Vec<ChatCompletionMessage>,
}

/// A chat completion endpoint returning the text of every choice, in order.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn create_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<Vec<String>, RecapError>;
}

// Models sometimes wrap the JSON in a markdown fence despite the instruction.
static CODE_FENCE: std::sync::LazyLock<Option<Regex>> = std::sync::LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n?(.*?)\s*```\s*$").ok()
});

#[derive(Deserialize)]
#[serde(untagged)]
enum TopicPayload {
    List(Vec<TopicSummary>),
    Wrapped { topics: Vec<TopicSummary> },
    Single(TopicSummary),
}

fn strip_code_fence(content: &str) -> &str {
    CODE_FENCE
        .as_ref()
        .and_then(|re| re.captures(content))
        .and_then(|caps| caps.get(1))
        .map_or(content.trim(), |m| m.as_str())
}

/// Parse a single choice's content into its topics.
///
/// # Errors
///
/// Returns `MalformedResponse` when the content is not a topic list.
pub fn parse_choice(content: &str) -> Result<Vec<TopicSummary>, RecapError> {
    let payload: TopicPayload = serde_json::from_str(strip_code_fence(content)).map_err(|e| {
        let snippet: String = content.chars().take(120).collect();
        RecapError::MalformedResponse(format!("{e} in choice content: {snippet}"))
    })?;

    Ok(match payload {
        TopicPayload::List(topics) | TopicPayload::Wrapped { topics } => topics,
        TopicPayload::Single(topic) => vec![topic],
    })
}

/// Flatten every choice's topics in choice order. One bad choice fails the lot.
///
/// # Errors
///
/// Returns `MalformedResponse` if any choice fails to parse.
pub fn parse_choices(contents: &[String]) -> Result<Vec<TopicSummary>, RecapError> {
    let mut topics = Vec::new();
    for content in contents {
        topics.extend(parse_choice(content)?);
    }
    Ok(topics)
}

/// # Errors
///
/// Propagates `ServiceUnavailable`, `HttpError` and `MalformedResponse` from the
/// completion call and from parsing its choices.
pub async fn summarize<C>(
    service: &C,
    messages: &[Message],
    config: &PipelineConfig,
) -> Result<Vec<TopicSummary>, RecapError>
where
    C: CompletionService + ?Sized,
{
    info!(
        "Getting summary for {} messages from {}...",
        messages.len(),
        config.model
    );

    let prompt = build_prompt(messages, config.lookback_days)?;

    #[cfg(feature = "debug-logs")]
    info!("Using prompt:\n{:?}", prompt);

    let request = CompletionRequest {
        model: config.model.clone(),
        temperature: config.temperature,
        messages: prompt,
    };

    let choices = service.create_completion(request).await?;
    let topics = parse_choices(&choices)?;

    info!(
        "Parsed {} topics from {} choices",
        topics.len(),
        choices.len()
    );

    Ok(topics)
}
