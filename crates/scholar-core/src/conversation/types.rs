//! Conversation data types

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routing::Category;

/// One question and its answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub response: String,
    /// Which specialist answered, if any
    pub specialist: Option<Category>,
}

impl Interaction {
    pub fn new(
        query: impl Into<String>,
        response: impl Into<String>,
        specialist: Option<Category>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            query: query.into(),
            response: response.into(),
            specialist,
        }
    }
}

/// A conversation and its append-only interaction log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Conversation {
    pub fn new(owner_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            created_at: now,
            last_activity: now,
            interactions: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Append an interaction and bump `last_activity`
    pub fn push(&mut self, interaction: Interaction) {
        self.last_activity = interaction.timestamp.max(self.last_activity);
        self.interactions.push(interaction);
    }

    /// The last `limit` interactions in chronological order (all if `None`)
    pub fn recent(&self, limit: Option<usize>) -> &[Interaction] {
        let len = self.interactions.len();
        let start = limit.map_or(0, |n| len.saturating_sub(n));
        &self.interactions[start..]
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            owner_id: self.owner_id.clone(),
            created_at: self.created_at,
            last_activity: self.last_activity,
            interaction_count: self.interactions.len(),
        }
    }

    pub fn info(&self) -> ConversationInfo {
        ConversationInfo {
            id: self.id,
            owner_id: self.owner_id.clone(),
            created_at: self.created_at,
            last_activity: self.last_activity,
            interaction_count: self.interactions.len(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Listing entry for a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub interaction_count: usize,
}

/// Conversation metadata without the interaction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationInfo {
    pub id: Uuid,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub interaction_count: usize,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Render interactions as alternating `Q:` / `A:` lines
pub fn format_interactions(interactions: &[Interaction]) -> String {
    interactions
        .iter()
        .flat_map(|i| [format!("Q: {}", i.query), format!("A: {}", i.response)])
        .collect::<Vec<_>>()
        .join("\n")
}
