//! Discord as a paginated message source

pub mod client;
pub mod wire;

pub use client::DiscordClient;
