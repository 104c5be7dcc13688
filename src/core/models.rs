use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RecapError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub id: String,
}

impl Channel {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// A chat message as the rest of the pipeline sees it, independent of the source's wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummary {
    pub topic_name: String,
    pub short_summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel: Channel,
    pub topics: Vec<TopicSummary>,
}

/// Result of one channel's fetch-then-summarize run.
/// A summarizer failure stays local to its channel.
#[derive(Debug)]
pub struct ChannelOutcome {
    pub channel: Channel,
    pub message_count: usize,
    pub result: Result<Vec<TopicSummary>, RecapError>,
}

impl ChannelOutcome {
    /// The final report for this channel, without the message count.
    ///
    /// # Errors
    ///
    /// Returns the summarizer error if this channel failed.
    pub fn report(&self) -> Result<ChannelReport, &RecapError> {
        self.result.as_ref().map(|topics| ChannelReport {
            channel: self.channel.clone(),
            topics: topics.clone(),
        })
    }
}
