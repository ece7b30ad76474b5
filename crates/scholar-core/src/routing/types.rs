//! Types for query routing

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subject a query is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Math,
    Physics,
    Chemistry,
    History,
    /// Answered by the general tutor prompt
    General,
    /// Nothing matched and the model could not decide
    Unknown,
}

impl Category {
    /// The four subjects that have a dedicated specialist
    pub const SPECIALISTS: [Category; 4] = [
        Category::Math,
        Category::Physics,
        Category::Chemistry,
        Category::History,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Physics => "physics",
            Self::Chemistry => "chemistry",
            Self::History => "history",
            Self::General => "general",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a dedicated specialist handles this category
    pub fn has_specialist(&self) -> bool {
        Self::SPECIALISTS.contains(self)
    }

    /// Tag recorded in the conversation log for an answer in this category
    pub fn recorded_tag(&self) -> Category {
        if self.has_specialist() {
            *self
        } else {
            Category::General
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "math" => Ok(Self::Math),
            "physics" => Ok(Self::Physics),
            "chemistry" => Ok(Self::Chemistry),
            "history" => Ok(Self::History),
            "general" => Ok(Self::General),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// How a routed query was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    /// The specialist produced an answer
    Success,
    /// A deterministic tool rejected the input
    ToolError,
    /// The model could not be reached after all retries
    UpstreamError,
}

impl std::fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::ToolError => write!(f, "tool_error"),
            Self::UpstreamError => write!(f, "upstream_error"),
        }
    }
}

/// Result of [`TutorRouter::handle_query`](super::TutorRouter::handle_query)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutedReply {
    /// Rendered answer text
    pub response: String,
    pub conversation_id: Uuid,
    /// Tag recorded with the interaction
    pub specialist: Category,
    pub status: ReplyStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_str() {
        for category in [
            Category::Math,
            Category::Physics,
            Category::Chemistry,
            Category::History,
            Category::General,
            Category::Unknown,
        ] {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_category_parse_is_lenient_on_case_and_space() {
        assert_eq!(" Physics ".parse::<Category>().unwrap(), Category::Physics);
        assert!("biology".parse::<Category>().is_err());
    }

    #[test]
    fn test_recorded_tag() {
        assert_eq!(Category::Math.recorded_tag(), Category::Math);
        assert_eq!(Category::Unknown.recorded_tag(), Category::General);
        assert_eq!(Category::General.recorded_tag(), Category::General);
    }

    #[test]
    fn test_serde_uses_lowercase() {
        let json = serde_json::to_string(&Category::Chemistry).unwrap();
        assert_eq!(json, "\"chemistry\"");
        let status = serde_json::to_string(&ReplyStatus::ToolError).unwrap();
        assert_eq!(status, "\"tool_error\"");
    }
}
