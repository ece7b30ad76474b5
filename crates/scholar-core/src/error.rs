//! Error types for Scholar

use thiserror::Error;
use uuid::Uuid;

use crate::tools::ToolError;

/// Result type alias using Scholar's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Scholar error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Conversation errors (E001-E099)
    #[error("Conversation '{0}' not found. Run `scholar chat` or POST /conversations to start one.")]
    InvalidConversation(String),

    // Network errors (E100-E199)
    #[error("Network error: {0}. Check your internet connection.")]
    NetworkError(#[from] reqwest::Error),

    #[error("LLM API error: {0}. Check your API key with `scholar config get llm.api_key`.")]
    LLMError(String),

    #[error("Model call failed after {attempts} attempt(s): {last_error}")]
    Upstream { attempts: u32, last_error: String },

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid query: {0}")]
    Validation(String),

    // Tool errors (E1300-E1399)
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an `InvalidConversation` error from a conversation id
    pub fn invalid_conversation(id: Uuid) -> Self {
        Self::InvalidConversation(id.to_string())
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConversation(_) => "E001",
            Self::NetworkError(_) => "E100",
            Self::LLMError(_) => "E101",
            Self::Upstream { .. } => "E102",
            Self::ConfigError(_) => "E600",
            Self::Validation(_) => "E800",
            Self::Tool(_) => "E1300",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::InvalidConversation(_) => Some("scholar chat".to_string()),
            Self::NetworkError(_) => Some("Check internet connection".to_string()),
            Self::LLMError(_) | Self::Upstream { .. } => {
                Some("scholar config get llm.api_key".to_string())
            }
            Self::ConfigError(_) => Some("scholar config list".to_string()),
            _ => None,
        }
    }

    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidConversation(_) | Self::Validation(_))
    }
}
