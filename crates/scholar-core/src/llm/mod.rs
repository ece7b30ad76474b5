//! LLM integration
//!
//! This module provides:
//! - The [`ModelEndpoint`] seam every specialist talks to
//! - An OpenRouter-compatible HTTP client implementing it
//! - The [`ModelInvoker`], which wraps an endpoint with response caching
//!   and bounded, fixed-interval retries

mod client;
mod invoker;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use client::{LlmClient, LlmClientBuilder};
pub use invoker::ModelInvoker;
pub use types::{ChatRequest, ChatResponse, Choice, LlmResponse, Message, MessageRole, Usage};

/// A remote text-generation model
///
/// Any failure is treated as transient by the invoker; implementations do
/// not need to classify errors.
#[async_trait]
pub trait ModelEndpoint: Send + Sync {
    /// Identity of the model, used as part of the cache fingerprint
    fn model_identity(&self) -> &str;

    /// Generate a completion for a single prompt
    async fn generate(&self, prompt: &str) -> Result<String>;
}
