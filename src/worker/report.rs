//! Markdown rendering of channel outcomes

use crate::core::models::{ChannelOutcome, ChannelReport, TopicSummary};

pub const EMPTY_WINDOW_LINE: &str = "_No messages in this window._";
pub const NO_TOPICS_LINE: &str = "_No topics identified._";

#[must_use]
pub fn format_topic(topic: &TopicSummary) -> String {
    format!("- **{}:** {}", topic.topic_name.trim(), topic.short_summary.trim())
}

fn header(channel_id: &str) -> String {
    format!("## <#{channel_id}>")
}

/// Renders `## <#id>` followed by one bullet per topic.
#[must_use]
pub fn format_channel_report(report: &ChannelReport) -> String {
    let body = if report.topics.is_empty() {
        NO_TOPICS_LINE.to_string()
    } else {
        report
            .topics
            .iter()
            .map(format_topic)
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!("{}\n{body}", header(&report.channel.id))
}

/// Renders a channel's report, or a status line for an empty window or a failed summary.
#[must_use]
pub fn format_report(outcome: &ChannelOutcome) -> String {
    match outcome.report() {
        Ok(_) if outcome.message_count == 0 => {
            format!("{}\n{EMPTY_WINDOW_LINE}", header(&outcome.channel.id))
        }
        Ok(report) => format_channel_report(&report),
        Err(e) => format!("{}\n_Summary unavailable: {e}_", header(&outcome.channel.id)),
    }
}

#[must_use]
pub fn format_reports(outcomes: &[ChannelOutcome]) -> Vec<String> {
    outcomes.iter().map(format_report).collect()
}
