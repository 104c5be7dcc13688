//! Configuration and the domain types shared by the fetch and summarize stages

pub mod config;
pub mod models;
