//! Prompt construction for topic summaries

use chrono::SecondsFormat;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use serde::Serialize;

use crate::core::models::Message;
use crate::errors::RecapError;

/// Instruction sent as the system turn. `{days}` is replaced with the lookback window.
pub const SYSTEM_PROMPT_TEMPLATE: &str = "You will receive the chat log of one channel on a \
    Discord server covering the past {days} days, encoded as a JSON array sorted by date. \
    Each entry has the message `content`, the `username` of its author and the `timestamp` it \
    was sent at. Several conversations may run in parallel and interleave. Identify the topics \
    discussed over the past {days} days and reply with ONLY a JSON array of objects, one per \
    topic, each with a `topicName` and a `shortSummary` string field. Do not wrap the array \
    in any other text.";

#[derive(Debug, Serialize)]
struct PromptMessage<'a> {
    content: &'a str,
    username: &'a str,
    timestamp: String,
}

#[must_use]
pub fn system_prompt(lookback_days: u32) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace("{days}", &lookback_days.to_string())
}

/// Serializes the messages oldest first, as the instruction promises.
///
/// # Errors
///
/// Returns a parse error if serialization fails.
pub fn serialize_messages(messages: &[Message]) -> Result<String, RecapError> {
    let mut ordered: Vec<&Message> = messages.iter().collect();
    ordered.sort_by_key(|m| m.timestamp);

    let payload: Vec<PromptMessage<'_>> = ordered
        .into_iter()
        .map(|m| PromptMessage {
            content: &m.content,
            username: &m.author,
            timestamp: m.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        })
        .collect();

    Ok(serde_json::to_string(&payload)?)
}

/// # Errors
///
/// Returns a parse error if the message log cannot be serialized.
pub fn build_prompt(
    messages: &[Message],
    lookback_days: u32,
) -> Result<Vec<ChatCompletionMessage>, RecapError> {
    Ok(vec![
        ChatCompletionMessage {
            role: MessageRole::system,
            content: Content::Text(system_prompt(lookback_days)),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        },
        ChatCompletionMessage {
            role: MessageRole::user,
            content: Content::Text(serialize_messages(messages)?),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        },
    ])
}
