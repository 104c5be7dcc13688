#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use openai_api_rs::v1::chat_completion::Content;
use recap::RecapError;
use recap::collect::{MessageSource, PageOutcome};
use recap::core::models::Message;
use recap::summarize::{CompletionRequest, CompletionService};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap()
}

/// `count` messages, newest first, one minute apart starting at `base_time()`.
/// Ids count down so that a higher id is newer, like Discord snowflakes.
pub fn history(count: usize) -> Vec<Message> {
    (0..count)
        .map(|i| Message {
            id: format!("{}", 100_000 - i),
            content: format!("message {i}"),
            author: format!("user{}", i % 3),
            timestamp: base_time() - ChronoDuration::minutes(i as i64),
        })
        .collect()
}

/// Serves a static newest-first history the way a paginated API would.
pub struct HistorySource {
    messages: Vec<Message>,
    pub requests: Mutex<Vec<Option<String>>>,
}

impl HistorySource {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageSource for HistorySource {
    async fn list_messages(
        &self,
        _channel_id: &str,
        page_size: u8,
        before: Option<&str>,
    ) -> PageOutcome {
        self.requests
            .lock()
            .unwrap()
            .push(before.map(str::to_string));

        let start = match before {
            None => 0,
            Some(id) => match self.messages.iter().position(|m| m.id == id) {
                Some(pos) => pos + 1,
                None => {
                    return PageOutcome::Failed {
                        status: Some(400),
                        error: RecapError::SourceError(format!("unknown message id {id}")),
                    };
                }
            },
        };

        let page = self
            .messages
            .iter()
            .skip(start)
            .take(usize::from(page_size))
            .cloned()
            .collect();
        PageOutcome::Page(page)
    }
}

/// Replays a fixed list of outcomes, then reports end of history.
pub struct ScriptedSource {
    script: Mutex<VecDeque<PageOutcome>>,
    pub requests: Mutex<Vec<Option<String>>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<PageOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Option<String>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSource for ScriptedSource {
    async fn list_messages(
        &self,
        _channel_id: &str,
        _page_size: u8,
        before: Option<&str>,
    ) -> PageOutcome {
        self.requests
            .lock()
            .unwrap()
            .push(before.map(str::to_string));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PageOutcome::Page(Vec::new()))
    }
}

/// Per-channel histories, each answered after a fixed delay.
pub struct ChannelMapSource {
    channels: HashMap<String, (Duration, Vec<Message>)>,
}

impl ChannelMapSource {
    pub fn new(channels: Vec<(&str, Duration, Vec<Message>)>) -> Self {
        Self {
            channels: channels
                .into_iter()
                .map(|(id, delay, messages)| (id.to_string(), (delay, messages)))
                .collect(),
        }
    }
}

#[async_trait]
impl MessageSource for ChannelMapSource {
    async fn list_messages(
        &self,
        channel_id: &str,
        page_size: u8,
        before: Option<&str>,
    ) -> PageOutcome {
        let Some((delay, messages)) = self.channels.get(channel_id) else {
            return PageOutcome::Failed {
                status: Some(404),
                error: RecapError::SourceError("Unknown Channel".to_string()),
            };
        };

        tokio::time::sleep(*delay).await;

        let start = before
            .and_then(|id| messages.iter().position(|m| m.id == id))
            .map_or(0, |pos| pos + 1);
        PageOutcome::Page(
            messages
                .iter()
                .skip(start)
                .take(usize::from(page_size))
                .cloned()
                .collect(),
        )
    }
}

/// What the fake completion service saw.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub temperature: f64,
    pub turns: usize,
    pub user_payload: String,
}

type Responder = Box<dyn Fn(&RecordedRequest) -> Result<Vec<String>, RecapError> + Send + Sync>;

pub struct FakeCompletionService {
    responder: Responder,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeCompletionService {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Result<Vec<String>, RecapError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(choices: Vec<&str>) -> Self {
        let choices: Vec<String> = choices.into_iter().map(str::to_string).collect();
        Self::new(move |_| Ok(choices.clone()))
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for FakeCompletionService {
    async fn create_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<Vec<String>, RecapError> {
        let user_payload = request
            .messages
            .last()
            .map(|m| match &m.content {
                Content::Text(text) => text.clone(),
                Content::ImageUrl(_) => String::new(),
            })
            .unwrap_or_default();

        let recorded = RecordedRequest {
            model: request.model.clone(),
            temperature: request.temperature,
            turns: request.messages.len(),
            user_payload,
        };
        self.requests.lock().unwrap().push(recorded.clone());

        (self.responder)(&recorded)
    }
}
