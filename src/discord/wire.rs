//! Discord REST payloads and their decoding into [`PageOutcome`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::collect::PageOutcome;
use crate::core::models::Message;
use crate::errors::RecapError;

/// Message Discord puts in the body of a rate-limited response.
pub const RATE_LIMIT_MESSAGE: &str = "You are being rate limited.";

/// Used when neither the body nor the headers say how long to wait.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
pub struct DiscordAuthor {
    pub username: String,
    pub global_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiscordMessage {
    pub id: String,
    #[serde(default)]
    pub content: String,
    pub author: DiscordAuthor,
    pub timestamp: DateTime<Utc>,
}

impl From<DiscordMessage> for Message {
    fn from(msg: DiscordMessage) -> Self {
        let author = msg
            .author
            .global_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(msg.author.username);

        Message {
            id: msg.id,
            content: msg.content,
            author,
            timestamp: msg.timestamp,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscordErrorBody {
    pub message: Option<String>,
    /// Discord's JSON error code, e.g. 50001 for missing access.
    pub code: Option<i64>,
    /// Seconds, possibly fractional.
    pub retry_after: Option<f64>,
}

impl DiscordErrorBody {
    fn is_rate_limit(&self) -> bool {
        self.message.as_deref() == Some(RATE_LIMIT_MESSAGE)
    }
}

/// `None` for negative, NaN, infinite or out-of-range delays.
fn seconds_to_duration(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs).ok()
}

/// Classify a raw channel-messages response.
///
/// `retry_after_header` is the raw `Retry-After` header value, consulted only when
/// the body carries no delay.
#[must_use]
pub fn decode_page(status: u16, retry_after_header: Option<&str>, body: &str) -> PageOutcome {
    if (200..300).contains(&status) {
        return match serde_json::from_str::<Vec<DiscordMessage>>(body) {
            Ok(messages) => PageOutcome::Page(messages.into_iter().map(Message::from).collect()),
            Err(e) => PageOutcome::Failed {
                status: Some(status),
                error: RecapError::SourceError(format!("unexpected page payload: {e}")),
            },
        };
    }

    let error: DiscordErrorBody = serde_json::from_str(body).unwrap_or_default();

    if status == 429 || error.is_rate_limit() {
        let retry_after = error
            .retry_after
            .and_then(seconds_to_duration)
            .or_else(|| {
                retry_after_header
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .and_then(seconds_to_duration)
            })
            .unwrap_or(DEFAULT_RETRY_AFTER);

        return PageOutcome::RateLimited { retry_after };
    }

    let mut message = error.message.unwrap_or_else(|| {
        let snippet: String = body.chars().take(200).collect();
        if snippet.is_empty() {
            format!("HTTP {status}")
        } else {
            snippet
        }
    });
    if let Some(code) = error.code {
        message = format!("{message} (code {code})");
    }

    PageOutcome::Failed {
        status: Some(status),
        error: RecapError::SourceError(message),
    }
}
