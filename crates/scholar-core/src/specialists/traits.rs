//! Specialist trait and answer type

use async_trait::async_trait;

use crate::conversation::Interaction;
use crate::error::{Error, Result};
use crate::routing::{Category, ReplyStatus};
use crate::tools::ToolError;

/// Outcome of a specialist handling a query
///
/// Failures are values rather than raised errors so a specialist can skip
/// the explanation call after a deterministic step fails. Text only gains
/// its `Error:` prefix in [`Answer::render`].
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// The answer text
    Ok(String),
    /// A deterministic tool rejected the input
    ToolFailed(ToolError),
    /// The model call failed after all retries
    UpstreamFailed(String),
}

impl Answer {
    /// Wrap the result of a model call
    pub fn from_model(result: Result<String>) -> Self {
        match result {
            Ok(text) => Self::Ok(text),
            Err(e) => Self::UpstreamFailed(e.to_string()),
        }
    }

    /// Text shown to the user
    pub fn render(&self) -> String {
        match self {
            Self::Ok(text) => text.clone(),
            Self::ToolFailed(e) => format!("Error: {}", e),
            Self::UpstreamFailed(reason) => format!("Error: {}", reason),
        }
    }

    pub fn status(&self) -> ReplyStatus {
        match self {
            Self::Ok(_) => ReplyStatus::Success,
            Self::ToolFailed(_) => ReplyStatus::ToolError,
            Self::UpstreamFailed(_) => ReplyStatus::UpstreamError,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// Render an explanation call result, degrading to the error text
///
/// Used after a successful deterministic step, where the computed result
/// is still worth returning without an explanation.
pub(crate) fn explanation_or_error(result: Result<String>) -> String {
    result.unwrap_or_else(|e: Error| {
        tracing::warn!(error = %e, "Explanation call failed, returning result without it");
        format!("Error: {}", e)
    })
}

/// A subject-specific tutor
///
/// Specialists read the history window they are given and never write to
/// the conversation store.
#[async_trait]
pub trait Specialist: Send + Sync {
    /// Subject this specialist answers
    fn category(&self) -> Category;

    /// Answer `query` using `history` (oldest first) as context
    async fn handle_query(&self, query: &str, history: &[Interaction]) -> Answer;
}
