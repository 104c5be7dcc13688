//! Two-stage recap pipeline: collect, then summarize, per channel.
//!
//! Channels run concurrently; the returned outcomes follow the configured
//! channel order regardless of which channel finishes first.

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;
use tracing::{Instrument, error, info, info_span};

use crate::collect::{MessageSource, fetch_messages};
use crate::core::config::PipelineConfig;
use crate::core::models::{Channel, ChannelOutcome};
use crate::summarize::{CompletionService, summarize};

/// Oldest instant still inside a `lookback_days` window ending at `now`.
/// Windows reaching past the representable range start at the earliest instant.
#[must_use]
pub fn cutoff_for(now: DateTime<Utc>, lookback_days: u32) -> DateTime<Utc> {
    TimeDelta::try_days(i64::from(lookback_days))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Collect and summarize a single channel.
pub async fn run_channel<S, C>(
    source: &S,
    service: &C,
    channel: &Channel,
    cutoff: DateTime<Utc>,
    config: &PipelineConfig,
) -> ChannelOutcome
where
    S: MessageSource + ?Sized,
    C: CompletionService + ?Sized,
{
    let messages = fetch_messages(source, channel, cutoff, &config.fetch).await;

    if messages.is_empty() {
        info!(channel = %channel.name, "No messages in window, skipping summary");
        return ChannelOutcome {
            channel: channel.clone(),
            message_count: 0,
            result: Ok(Vec::new()),
        };
    }

    let result = summarize(service, &messages, config).await;
    if let Err(e) = &result {
        error!(channel = %channel.name, "Failed to summarize channel: {}", e);
    }

    ChannelOutcome {
        channel: channel.clone(),
        message_count: messages.len(),
        result,
    }
}

/// Run every configured channel concurrently and join the outcomes in configuration order.
pub async fn run_pipeline<S, C>(
    source: &S,
    service: &C,
    config: &PipelineConfig,
    now: DateTime<Utc>,
) -> Vec<ChannelOutcome>
where
    S: MessageSource + ?Sized,
    C: CompletionService + ?Sized,
{
    let cutoff = cutoff_for(now, config.lookback_days);
    info!(
        "Recapping {} channels since {}",
        config.channels.len(),
        cutoff.to_rfc3339()
    );

    let runs = config.channels.iter().map(|channel| {
        run_channel(source, service, channel, cutoff, config)
            .instrument(info_span!("channel", channel = %channel.name, channel_id = %channel.id))
    });

    join_all(runs).await
}
