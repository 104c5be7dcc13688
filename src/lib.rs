//! Recap - periodic topic summaries of Discord channels using `OpenAI` chat completions.
//!
//! A run has two stages per channel:
//! 1. Collection walks the channel history backwards, page by page, until the
//!    lookback cutoff is crossed. Rate limits are waited out; other source
//!    errors end collection early with whatever was gathered.
//! 2. Summarization sends the collected log to a completion service and
//!    flattens every returned choice into one topic list.
//!
//! Channels run concurrently and the reports come back in configuration order.
//!
//! # Architecture
//!
//! The system uses:
//! - AWS Lambda for execution (HTTP or scheduled trigger)
//! - reqwest for the Discord REST API and `OpenAI` chat completions
//! - openai-api-rs message types for prompt construction
//! - Tokio for async runtime
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use recap::ai::LlmClient;
//! use recap::core::config::PipelineConfig;
//! use recap::core::models::Channel;
//! use recap::discord::DiscordClient;
//! use recap::worker::{pipeline::run_pipeline, report::format_reports};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     recap::setup_logging();
//!
//!     let config = PipelineConfig::new(vec![Channel::new(
//!         "#development-chat",
//!         "1209845180010856508",
//!     )]);
//!     let source = DiscordClient::new("dummy_discord_token".to_string(), None)?;
//!     let llm = LlmClient::new("dummy_openai_key".to_string(), None, None);
//!
//!     let outcomes = run_pipeline(&source, &llm, &config, Utc::now()).await;
//!     for report in format_reports(&outcomes) {
//!         println!("{report}");
//!     }
//!
//!     Ok(())
//! }
//! ```
pub mod ai;
pub mod collect;
pub mod core;
pub mod discord;
pub mod errors;
pub mod summarize;
pub mod worker;

pub use errors::RecapError;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. Calling it more than once is harmless.
///
/// # Example
///
/// ```
/// recap::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
