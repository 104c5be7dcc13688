//! Discord API client module
//!
//! Issues channel-history page requests. Every outcome, including transport
//! failures, is reported as a [`PageOutcome`] so the collector decides what
//! to do with it.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::wire::decode_page;
use crate::collect::{MessageSource, PageOutcome};
use crate::errors::RecapError;

pub const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Discord REST client authenticated with a bot token
pub struct DiscordClient {
    token: String,
    base_url: Url,
}

impl DiscordClient {
    /// # Errors
    ///
    /// Returns a config error if `base_url` is not an absolute URL.
    pub fn new(token: String, base_url: Option<&str>) -> Result<Self, RecapError> {
        let raw = base_url.unwrap_or(DEFAULT_DISCORD_API_BASE);
        let base_url = Url::parse(raw).map_err(|e| {
            RecapError::ConfigError(format!("Invalid Discord API base '{raw}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RecapError::ConfigError(format!(
                "Discord API base '{raw}' cannot be used as a base URL"
            )));
        }

        Ok(Self { token, base_url })
    }

    /// Builds `{base}/channels/{id}/messages?limit=N[&before=ID]`.
    #[must_use]
    pub fn messages_url(&self, channel_id: &str, page_size: u8, before: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["channels", channel_id, "messages"]);
        }

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &page_size.to_string());
            if let Some(before) = before {
                query.append_pair("before", before);
            }
        }

        url
    }
}

#[async_trait]
impl MessageSource for DiscordClient {
    async fn list_messages(
        &self,
        channel_id: &str,
        page_size: u8,
        before: Option<&str>,
    ) -> PageOutcome {
        let url = self.messages_url(channel_id, page_size, before);

        let resp = match HTTP_CLIENT
            .get(url)
            .header("Authorization", format!("Bot {}", self.token))
            .header("Content-Type", "application/json")
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                return PageOutcome::Failed {
                    status: None,
                    error: RecapError::SourceError(format!("request failed: {e}")),
                };
            }
        };

        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match resp.text().await {
            Ok(body) => decode_page(status, retry_after.as_deref(), &body),
            Err(e) => PageOutcome::Failed {
                status: Some(status),
                error: RecapError::SourceError(format!("unreadable response body: {e}")),
            },
        }
    }
}
