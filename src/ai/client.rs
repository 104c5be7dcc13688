//! LLM (`OpenAI`) API client module
//!
//! Encapsulates the chat completions call used to generate topic summaries.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{error, info};

use crate::errors::RecapError;
use crate::summarize::{CompletionRequest, CompletionService};

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com";

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .unwrap_or_else(|_| Client::new())
});

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Rough prompt size for logging, at about four characters per token.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// LLM API client for generating summaries
pub struct LlmClient {
    api_key: String,
    org_id: Option<String>,
    base_url: String,
}

impl LlmClient {
    #[must_use]
    pub fn new(api_key: String, org_id: Option<String>, base_url: Option<String>) -> Self {
        Self {
            api_key,
            org_id,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

/// Build the chat completions request body.
///
/// Image parts are dropped; topic summaries only ever send text.
#[must_use]
pub fn build_request_body(request: &CompletionRequest) -> Value {
    let messages: Vec<Value> = request
        .messages
        .iter()
        .filter_map(|msg: &ChatCompletionMessage| {
            let role_str = match msg.role {
                MessageRole::system => "system",
                MessageRole::user => "user",
                MessageRole::assistant => "assistant",
                MessageRole::function => "function",
                MessageRole::tool => "tool",
            };

            match &msg.content {
                Content::Text(text) => Some(json!({
                    "role": role_str,
                    "content": text
                })),
                Content::ImageUrl(_) => None,
            }
        })
        .collect();

    json!({
        "model": request.model,
        "temperature": request.temperature,
        "messages": messages
    })
}

/// Pull each choice's text out of a chat completions response body.
///
/// # Errors
///
/// Returns `MalformedResponse` if the envelope does not decode or a choice has no content.
pub fn extract_choice_contents(body: &str) -> Result<Vec<String>, RecapError> {
    let response: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        RecapError::MalformedResponse(format!("Failed to parse OpenAI response: {e}"))
    })?;

    response
        .choices
        .into_iter()
        .enumerate()
        .map(|(index, choice)| {
            choice.message.content.ok_or_else(|| {
                RecapError::MalformedResponse(format!("Choice {index} has no content"))
            })
        })
        .collect()
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn create_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<Vec<String>, RecapError> {
        let estimated_input_tokens = request
            .messages
            .iter()
            .map(|msg| estimate_tokens(&format!("{:?}", msg.content)))
            .sum::<usize>();

        info!(
            "Requesting completion from {} (estimated input tokens: {})",
            request.model, estimated_input_tokens
        );

        let request_body = build_request_body(&request);

        let mut headers = reqwest::header::HeaderMap::new();
        let auth_value = format!("Bearer {}", self.api_key)
            .parse()
            .map_err(|e| RecapError::HttpError(format!("Invalid Authorization header: {e}")))?;
        headers.insert("Authorization", auth_value);

        if let Some(org) = &self.org_id {
            let org_value = org.parse().map_err(|e| {
                RecapError::HttpError(format!("Invalid OpenAI-Organization header: {e}"))
            })?;
            headers.insert("OpenAI-Organization", org_value);
        }

        let response = HTTP_CLIENT
            .post(self.completions_url())
            .headers(headers)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("OpenAI API returned {}: {}", status, body);
            return Err(RecapError::ServiceUnavailable(format!(
                "OpenAI API returned {status}"
            )));
        }

        extract_choice_contents(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_message(role: MessageRole, text: &str) -> ChatCompletionMessage {
        ChatCompletionMessage {
            role,
            content: Content::Text(text.to_string()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_build_request_body_shape() {
        let request = CompletionRequest {
            model: "gpt-4-turbo".to_string(),
            temperature: 0.2,
            messages: vec![
                text_message(MessageRole::system, "policy"),
                text_message(MessageRole::user, "[]"),
            ],
        };

        let body = build_request_body(&request);

        assert_eq!(body["model"], "gpt-4-turbo");
        assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "policy");
        assert_eq!(messages[1]["role"], "user");
    }

    #[test]
    fn test_extract_choice_contents_in_order() {
        let body = r#"{"id":"x","choices":[
            {"index":0,"message":{"role":"assistant","content":"[1]"}},
            {"index":1,"message":{"role":"assistant","content":"[2]"}}
        ]}"#;
        assert_eq!(
            extract_choice_contents(body).unwrap(),
            vec!["[1]".to_string(), "[2]".to_string()]
        );
    }

    #[test]
    fn test_extract_choice_contents_rejects_null_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(matches!(
            extract_choice_contents(body),
            Err(RecapError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_extract_choice_contents_rejects_non_json() {
        assert!(extract_choice_contents("<html>bad gateway</html>").is_err());
    }

    #[test]
    fn test_completions_url_trims_trailing_slash() {
        let client = LlmClient::new(
            "key".to_string(),
            None,
            Some("http://localhost:9000/".to_string()),
        );
        assert_eq!(
            client.completions_url(),
            "http://localhost:9000/v1/chat/completions"
        );
    }
}
