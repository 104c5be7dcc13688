//! Paginated message collection
//!
//! Walks a reverse-chronological message source one page at a time until the
//! cutoff is crossed, the history runs out, or the source fails. Collection
//! never fails: whatever was gathered before a source error is returned.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{info, warn};

use crate::core::config::FetchOptions;
use crate::core::models::{Channel, Message};
use crate::errors::RecapError;

/// Decoded response to a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Messages newest first. Empty means the start of history was reached.
    Page(Vec<Message>),
    RateLimited { retry_after: Duration },
    /// `status` is `None` when no response arrived at all.
    Failed {
        status: Option<u16>,
        error: RecapError,
    },
}

/// A paginated "list messages" endpoint.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch up to `page_size` messages strictly older than `before`, or the newest
    /// messages when `before` is `None`.
    async fn list_messages(
        &self,
        channel_id: &str,
        page_size: u8,
        before: Option<&str>,
    ) -> PageOutcome;
}

/// Why a cursor stopped requesting pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStep {
    Continue,
    EndOfHistory,
    CutoffReached,
}

/// Pagination state for one channel. Lives only for the duration of a fetch.
#[derive(Debug)]
pub struct FetchCursor<'a> {
    pub channel: &'a Channel,
    pub cutoff: DateTime<Utc>,
    pub before_id: Option<String>,
    accumulated: Vec<Message>,
}

impl<'a> FetchCursor<'a> {
    #[must_use]
    pub fn new(channel: &'a Channel, cutoff: DateTime<Utc>) -> Self {
        Self {
            channel,
            cutoff,
            before_id: None,
            accumulated: Vec::new(),
        }
    }

    /// Absorbs a successful page. The whole page is kept even when it crosses the cutoff.
    pub fn advance(&mut self, page: Vec<Message>) -> CursorStep {
        let Some(oldest) = page.last() else {
            return CursorStep::EndOfHistory;
        };

        let step = if oldest.timestamp > self.cutoff {
            self.before_id = Some(oldest.id.clone());
            CursorStep::Continue
        } else {
            CursorStep::CutoffReached
        };

        self.accumulated.extend(page);
        step
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accumulated.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accumulated.is_empty()
    }

    #[must_use]
    pub fn finish(self) -> Vec<Message> {
        self.accumulated
    }
}

/// Collect every message newer than `cutoff`, plus the remainder of the page that crosses it.
pub async fn fetch_messages<S>(
    source: &S,
    channel: &Channel,
    cutoff: DateTime<Utc>,
    options: &FetchOptions,
) -> Vec<Message>
where
    S: MessageSource + ?Sized,
{
    let mut cursor = FetchCursor::new(channel, cutoff);
    let mut rate_limit_retries: u32 = 0;

    loop {
        info!(
            channel = %channel.name,
            "Fetching {} messages, prior to message ID: {}...",
            options.page_size,
            cursor.before_id.as_deref().unwrap_or("<nil>")
        );

        let outcome = source
            .list_messages(&channel.id, options.page_size, cursor.before_id.as_deref())
            .await;

        match outcome {
            PageOutcome::RateLimited { retry_after } => {
                if options
                    .max_rate_limit_retries
                    .is_some_and(|max| rate_limit_retries >= max)
                {
                    let error = RecapError::RateLimited { retry_after };
                    warn!(
                        channel = %channel.name,
                        "{} (gave up after {} retries), returning the {} messages collected",
                        error,
                        rate_limit_retries,
                        cursor.len()
                    );
                    return cursor.finish();
                }

                rate_limit_retries += 1;
                let wait = retry_after.saturating_add(options.safety_margin);
                info!(
                    channel = %channel.name,
                    "API rate limit detected, waiting {}ms...",
                    wait.as_millis()
                );
                tokio::time::sleep(wait).await;
            }
            PageOutcome::Failed { status, error } => {
                warn!(
                    channel = %channel.name,
                    status = ?status,
                    "{}, returning the {} messages collected",
                    error,
                    cursor.len()
                );
                return cursor.finish();
            }
            PageOutcome::Page(page) => {
                rate_limit_retries = 0;
                info!(channel = %channel.name, "Fetched {} messages...", page.len());

                match cursor.advance(page) {
                    CursorStep::Continue => {}
                    CursorStep::EndOfHistory | CursorStep::CutoffReached => {
                        info!(
                            channel = %channel.name,
                            "Complete! Collected {} messages",
                            cursor.len()
                        );
                        return cursor.finish();
                    }
                }
            }
        }
    }
}
