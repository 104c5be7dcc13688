//! `OpenAI` chat completions: request building and the HTTP client

pub mod client;
pub mod prompt_builder;

pub use client::LlmClient;
