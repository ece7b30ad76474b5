//! Conversation tracking
//!
//! Conversations are append-only logs of [`Interaction`]s keyed by a
//! random UUID. They live only in memory and are discarded on delete or
//! when idle longer than the retention window.

mod store;
mod types;

pub use store::{ConversationStore, TurnLock};
pub use types::{
    Conversation, ConversationInfo, ConversationSummary, Interaction, format_interactions,
};
