//! In-memory conversation store

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::routing::Category;

use super::types::{
    Conversation, ConversationInfo, ConversationSummary, Interaction, format_interactions,
};

/// Per-conversation lock serializing turns in arrival order
pub type TurnLock = Arc<Mutex<()>>;

#[derive(Debug)]
struct Slot {
    conversation: Conversation,
    turn: TurnLock,
}

/// Conversation id → interaction log
///
/// Every operation takes the inner lock only for the duration of a map
/// lookup or update. Callers receive clones, never references into the map.
#[derive(Debug, Default)]
pub struct ConversationStore {
    slots: RwLock<HashMap<Uuid, Slot>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared access to the map
    ///
    /// Every critical section leaves the map consistent, so a poisoned lock
    /// is recovered rather than treated as an empty store.
    fn read_slots(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Slot>> {
        self.slots.read().unwrap_or_else(|poisoned| {
            warn!("Conversation store lock poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write_slots(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Slot>> {
        self.slots.write().unwrap_or_else(|poisoned| {
            warn!("Conversation store lock poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Create a conversation and return its id
    pub fn create(&self, owner_id: Option<String>) -> Uuid {
        let conversation = Conversation::new(owner_id);
        let id = conversation.id;

        self.write_slots().insert(
            id,
            Slot {
                conversation,
                turn: Arc::new(Mutex::new(())),
            },
        );

        info!(conversation_id = %id, "Created conversation");
        id
    }

    pub fn exists(&self, id: Uuid) -> bool {
        self.read_slots().contains_key(&id)
    }

    /// Append an interaction to an existing conversation
    pub fn append(
        &self,
        id: Uuid,
        query: impl Into<String>,
        response: impl Into<String>,
        specialist: Option<Category>,
    ) -> Result<()> {
        let interaction = Interaction::new(query, response, specialist);

        let mut slots = self.write_slots();
        let slot = slots
            .get_mut(&id)
            .ok_or_else(|| Error::invalid_conversation(id))?;
        slot.conversation.push(interaction);

        debug!(
            conversation_id = %id,
            interactions = slot.conversation.interactions.len(),
            "Appended interaction"
        );
        Ok(())
    }

    /// The last `limit` interactions in chronological order
    ///
    /// `None` returns the whole log; an unknown id yields an empty list.
    pub fn history(&self, id: Uuid, limit: Option<usize>) -> Vec<Interaction> {
        self.read_slots()
            .get(&id)
            .map(|slot| slot.conversation.recent(limit).to_vec())
            .unwrap_or_default()
    }

    /// History rendered as `Q:` / `A:` lines, empty when there is none
    pub fn formatted_history(&self, id: Uuid, limit: usize) -> String {
        format_interactions(&self.history(id, Some(limit)))
    }

    pub fn info(&self, id: Uuid) -> Option<ConversationInfo> {
        self.read_slots()
            .get(&id)
            .map(|slot| slot.conversation.info())
    }

    /// Conversations, optionally filtered by owner, most recently active first
    pub fn list(&self, owner_id: Option<&str>) -> Vec<ConversationSummary> {
        let mut summaries: Vec<ConversationSummary> = self
            .read_slots()
            .values()
            .map(|slot| &slot.conversation)
            .filter(|c| owner_id.is_none_or(|owner| c.owner_id.as_deref() == Some(owner)))
            .map(Conversation::summary)
            .collect();

        summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        summaries
    }

    /// Remove a conversation; `false` if it did not exist
    pub fn delete(&self, id: Uuid) -> bool {
        let removed = self.write_slots().remove(&id).is_some();

        if removed {
            info!(conversation_id = %id, "Deleted conversation");
        }
        removed
    }

    /// Evict conversations idle for longer than `age`
    ///
    /// An `age` reaching past the earliest representable time evicts nothing.
    pub fn evict_older_than(&self, age: Duration) -> usize {
        match Utc::now().checked_sub_signed(age) {
            Some(cutoff) => self.evict_inactive_since(cutoff),
            None => {
                warn!(age_days = age.num_days(), "Retention window out of range, nothing evicted");
                0
            }
        }
    }

    /// Evict conversations whose last activity is before `cutoff`
    pub fn evict_inactive_since(&self, cutoff: DateTime<Utc>) -> usize {
        let evicted = {
            let mut slots = self.write_slots();
            let before = slots.len();
            slots.retain(|_, slot| slot.conversation.last_activity >= cutoff);
            before - slots.len()
        };

        info!(evicted, cutoff = %cutoff, "Evicted inactive conversations");
        evicted
    }

    /// Lock that serializes turns on one conversation
    ///
    /// The lock is a `tokio::sync::Mutex`, so waiters are granted it in the
    /// order they asked. `None` if the conversation does not exist.
    pub fn turn_lock(&self, id: Uuid) -> Option<TurnLock> {
        self.read_slots()
            .get(&id)
            .map(|slot| Arc::clone(&slot.turn))
    }

    /// Attach an opaque metadata value to a conversation
    pub fn set_metadata(
        &self,
        id: Uuid,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<()> {
        let mut slots = self.write_slots();
        let slot = slots
            .get_mut(&id)
            .ok_or_else(|| Error::invalid_conversation(id))?;
        slot.conversation.metadata.insert(key.into(), value);
        Ok(())
    }

    /// Number of live conversations
    pub fn len(&self) -> usize {
        self.read_slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_returns_fresh_ids() {
        let store = ConversationStore::new();
        let a = store.create(None);
        let b = store.create(Some("bob".to_string()));
        assert_ne!(a, b);
        assert!(store.exists(a));
        assert!(store.exists(b));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_append_to_unknown_conversation_fails() {
        let store = ConversationStore::new();
        let err = store
            .append(Uuid::new_v4(), "q", "a", Some(Category::Math))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConversation(_)));
    }

    #[test]
    fn test_history_limit_returns_last_in_order() {
        let store = ConversationStore::new();
        let id = store.create(None);
        for n in 1..=5 {
            store.append(id, format!("q{n}"), format!("a{n}"), None).unwrap();
        }

        let history = store.history(id, Some(2));
        let queries: Vec<_> = history.iter().map(|i| i.query.as_str()).collect();
        assert_eq!(queries, ["q4", "q5"]);
        assert_eq!(store.history(id, None).len(), 5);
        assert!(store.history(Uuid::new_v4(), None).is_empty());
    }

    #[test]
    fn test_formatted_history() {
        let store = ConversationStore::new();
        let id = store.create(None);
        assert_eq!(store.formatted_history(id, 3), "");

        store.append(id, "2 + 2", "Result: 4", Some(Category::Math)).unwrap();
        assert_eq!(store.formatted_history(id, 3), "Q: 2 + 2\nA: Result: 4");
    }

    #[test]
    fn test_delete_twice() {
        let store = ConversationStore::new();
        let id = store.create(None);
        assert!(store.delete(id));
        assert!(!store.exists(id));
        assert!(!store.delete(id));
        assert!(store.info(id).is_none());
    }

    #[test]
    fn test_list_filters_by_owner_and_sorts_by_activity() {
        let store = ConversationStore::new();
        let older = store.create(Some("alice".to_string()));
        let newer = store.create(Some("alice".to_string()));
        store.create(Some("bob".to_string()));
        store.append(newer, "q", "a", None).unwrap();

        let alice = store.list(Some("alice"));
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].id, newer);
        assert_eq!(alice[1].id, older);
        assert_eq!(alice[0].interaction_count, 1);

        assert_eq!(store.list(None).len(), 3);
        assert!(store.list(Some("carol")).is_empty());
    }

    #[test]
    fn test_eviction_by_cutoff() {
        let store = ConversationStore::new();
        let id = store.create(None);

        assert_eq!(store.evict_older_than(Duration::days(30)), 0);
        assert!(store.exists(id));

        let future = Utc::now() + Duration::seconds(5);
        assert_eq!(store.evict_inactive_since(future), 1);
        assert!(!store.exists(id));
    }

    #[test]
    fn test_metadata_and_info() {
        let store = ConversationStore::new();
        let id = store.create(Some("alice".to_string()));
        store
            .set_metadata(id, "level", serde_json::json!("beginner"))
            .unwrap();

        let info = store.info(id).unwrap();
        assert_eq!(info.owner_id.as_deref(), Some("alice"));
        assert_eq!(info.metadata["level"], "beginner");
        assert!(store.set_metadata(Uuid::new_v4(), "k", serde_json::json!(1)).is_err());
    }

    #[tokio::test]
    async fn test_turn_lock_is_shared_per_conversation() {
        let store = ConversationStore::new();
        let id = store.create(None);

        let first = store.turn_lock(id).unwrap();
        let second = store.turn_lock(id).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let _guard = first.lock().await;
        assert!(second.try_lock().is_err());
        assert!(store.turn_lock(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_evict_with_out_of_range_age_evicts_nothing() {
        let store = ConversationStore::new();
        store.create(None);

        assert_eq!(store.evict_older_than(Duration::days(4_000_000_000)), 0);
        assert_eq!(store.len(), 1);
        assert_eq!(store.evict_older_than(Duration::zero() - Duration::days(1)), 1);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let store = Arc::new(ConversationStore::new());
        let existing = store.create(None);

        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.slots.write().unwrap();
            panic!("panic while holding the store lock");
        })
        .join();
        assert!(store.slots.is_poisoned());

        let id = store.create(Some("alice".to_string()));
        assert!(store.exists(id));
        assert!(store.exists(existing));
        store.append(id, "q", "a", None).unwrap();
        assert_eq!(store.history(id, None).len(), 1);
        assert_eq!(store.list(Some("alice")).len(), 1);
    }
}
