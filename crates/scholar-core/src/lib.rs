//! Scholar Core Library
//!
//! This crate provides the core functionality for Scholar, a tutoring
//! router that answers free-text questions with subject specialists:
//! - Routing (keyword classifier with model fallback, tutor router)
//! - Specialists (math, physics, chemistry, history)
//! - Deterministic tools (calculator, equation solver, physical constants)
//! - Conversations (in-memory history store)
//! - LLM integration (OpenRouter API, response cache, retrying invoker)
//! - HTTP API (axum)
//!
//! The library emits `tracing` events but never installs a subscriber;
//! that is left to the binary or the test harness.

pub mod api;
pub mod cache;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod routing;
pub mod specialists;
pub mod testing;
pub mod tools;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::conversation::{ConversationStore, Interaction};
    pub use crate::error::{Error, Result};
    pub use crate::llm::{LlmClient, ModelEndpoint, ModelInvoker};
    pub use crate::routing::{Category, RoutedReply, TutorRouter};
    pub use crate::specialists::{Answer, Specialist};
}
