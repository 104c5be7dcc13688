//! Pipeline orchestration and the Lambda handler that triggers it

pub mod handler;
pub mod pipeline;
pub mod report;

// Re-export the main handler for convenience
pub use handler::handler;
