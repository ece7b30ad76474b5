//! Tutor router: classify, fetch history, dispatch, record

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::classifier::Classifier;
use super::types::{Category, RoutedReply};
use crate::cache::ResponseCache;
use crate::config::{Config, ConversationConfig};
use crate::conversation::{
    ConversationInfo, ConversationStore, ConversationSummary, Interaction,
};
use crate::error::{Error, Result};
use crate::llm::{ModelEndpoint, ModelInvoker};
use crate::specialists::{Answer, Specialist, default_specialists, history_context};

/// Sentinel for "let the classifier decide"
pub const AUTO_SPECIALIST: &str = "auto";

/// Window sizes and limits used by the router
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Interactions handed to a specialist
    pub history_window: usize,
    /// Interactions used by the general tutor prompt
    pub general_window: usize,
    /// Interactions shown to the model classifier
    pub classifier_window: usize,
    /// Longest accepted query, in characters
    pub max_query_chars: usize,
    /// Idle time after which conversations are evicted
    pub retention: chrono::Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::from(&ConversationConfig::default())
    }
}

impl From<&ConversationConfig> for RouterConfig {
    fn from(config: &ConversationConfig) -> Self {
        Self {
            history_window: config.history_window,
            general_window: config.general_window,
            classifier_window: config.classifier_window,
            max_query_chars: config.max_query_chars,
            retention: config.retention(),
        }
    }
}

/// Routes tutoring questions to subject specialists
///
/// Turns on one conversation are serialized by that conversation's turn
/// lock, so each turn sees every earlier turn's interaction. Turns on
/// different conversations run concurrently.
pub struct TutorRouter {
    config: RouterConfig,
    store: Arc<ConversationStore>,
    invoker: Arc<ModelInvoker>,
    classifier: Classifier,
    specialists: HashMap<Category, Arc<dyn Specialist>>,
}

impl TutorRouter {
    /// Create a router with the four default specialists
    pub fn new(invoker: Arc<ModelInvoker>, store: Arc<ConversationStore>) -> Self {
        Self::with_config(invoker, store, RouterConfig::default())
    }

    /// Create a router with custom configuration
    pub fn with_config(
        invoker: Arc<ModelInvoker>,
        store: Arc<ConversationStore>,
        config: RouterConfig,
    ) -> Self {
        let classifier =
            Classifier::new(Arc::clone(&invoker)).with_window(config.classifier_window);
        Self {
            specialists: default_specialists(&invoker),
            config,
            store,
            invoker,
            classifier,
        }
    }

    /// Wire a router over `endpoint` using the cache, retry and
    /// conversation sections of `config`
    pub fn from_config(config: &Config, endpoint: Arc<dyn ModelEndpoint>) -> Self {
        let cache = Arc::new(ResponseCache::from_config(&config.cache));
        let invoker =
            Arc::new(ModelInvoker::new(endpoint, cache).with_retry_config(&config.retry));
        Self::with_config(
            invoker,
            Arc::new(ConversationStore::new()),
            RouterConfig::from(&config.conversation),
        )
    }

    /// Replace or add the specialist for its category
    pub fn with_specialist(mut self, specialist: Arc<dyn Specialist>) -> Self {
        self.specialists.insert(specialist.category(), specialist);
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub fn invoker(&self) -> &Arc<ModelInvoker> {
        &self.invoker
    }

    /// Reject empty or oversized queries
    pub fn validate_query(&self, query: &str) -> Result<()> {
        if query.trim().is_empty() {
            return Err(Error::Validation("query must not be empty".to_string()));
        }
        let chars = query.chars().count();
        if chars > self.config.max_query_chars {
            return Err(Error::Validation(format!(
                "query is {} characters long, the limit is {}",
                chars, self.config.max_query_chars
            )));
        }
        Ok(())
    }

    /// Resolve a preferred specialist tag
    ///
    /// `None` or `"auto"` means classify. Unrecognized tags fall back to the
    /// general tutor.
    fn preferred_category(preferred: Option<&str>) -> Option<Category> {
        let tag = preferred.map(str::trim).filter(|t| !t.is_empty())?;
        if tag.eq_ignore_ascii_case(AUTO_SPECIALIST) {
            return None;
        }
        match tag.parse::<Category>() {
            Ok(category) => Some(category),
            Err(_) => {
                warn!(preferred = %tag, "Unrecognized preferred specialist, using general tutor");
                Some(Category::General)
            }
        }
    }

    /// Answer one query and record it in its conversation
    ///
    /// Creates a conversation when `conversation_id` is `None`. Fails with
    /// [`Error::InvalidConversation`] for an unknown id and with
    /// [`Error::Validation`] for an empty or oversized query. Tool and
    /// model failures are not errors: they are rendered into the reply and
    /// recorded like any other answer.
    pub async fn handle_query(
        &self,
        query: &str,
        conversation_id: Option<Uuid>,
        preferred: Option<&str>,
    ) -> Result<RoutedReply> {
        self.validate_query(query)?;

        let conversation_id = match conversation_id {
            Some(id) => id,
            None => self.store.create(None),
        };

        let turn = self
            .store
            .turn_lock(conversation_id)
            .ok_or_else(|| Error::invalid_conversation(conversation_id))?;
        let _turn = turn.lock().await;

        let history = self
            .store
            .history(conversation_id, Some(self.config.history_window));

        let category = match Self::preferred_category(preferred) {
            Some(category) => {
                info!(conversation_id = %conversation_id, specialist = %category, "Using preferred specialist");
                category
            }
            None => self.classifier.classify(query, &history).await,
        };

        let (answer, tag) = match self.specialists.get(&category) {
            Some(specialist) => {
                info!(conversation_id = %conversation_id, specialist = %category, "Routing query");
                (specialist.handle_query(query, &history).await, category)
            }
            None => {
                warn!(conversation_id = %conversation_id, category = %category, "No specialist for query, using general tutor");
                (self.general_answer(query, &history).await, category.recorded_tag())
            }
        };

        let response = answer.render();
        self.store
            .append(conversation_id, query, response.clone(), Some(tag))?;

        debug!(conversation_id = %conversation_id, status = %answer.status(), "Recorded interaction");
        Ok(RoutedReply {
            response,
            conversation_id,
            specialist: tag,
            status: answer.status(),
        })
    }

    async fn general_answer(&self, query: &str, history: &[Interaction]) -> Answer {
        let start = history.len().saturating_sub(self.config.general_window);
        let prompt = format!(
            "{}You are a helpful tutor. Please answer this question or reply with a general \
             response based on the previous conversation: {}",
            history_context(&history[start..]),
            query
        );
        Answer::from_model(self.invoker.invoke(&prompt).await)
    }

    pub fn create_conversation(&self, owner_id: Option<String>) -> Uuid {
        self.store.create(owner_id)
    }

    /// Interactions of a conversation, oldest first
    pub fn conversation_history(&self, id: Uuid, limit: Option<usize>) -> Result<Vec<Interaction>> {
        if !self.store.exists(id) {
            return Err(Error::invalid_conversation(id));
        }
        Ok(self.store.history(id, limit))
    }

    pub fn list_conversations(&self, owner_id: Option<&str>) -> Vec<ConversationSummary> {
        self.store.list(owner_id)
    }

    pub fn conversation_info(&self, id: Uuid) -> Option<ConversationInfo> {
        self.store.info(id)
    }

    pub fn delete_conversation(&self, id: Uuid) -> bool {
        self.store.delete(id)
    }

    /// Evict conversations idle longer than the retention window
    pub fn evict_stale_conversations(&self) -> usize {
        self.store.evict_older_than(self.config.retention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::ReplyStatus;
    use crate::testing::ScriptedModel;
    use std::time::Duration;

    fn router(model: Arc<ScriptedModel>) -> TutorRouter {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
        let invoker = Arc::new(ModelInvoker::new(model, cache).with_max_retries(1));
        TutorRouter::new(invoker, Arc::new(ConversationStore::new()))
    }

    #[test]
    fn test_preferred_category() {
        assert_eq!(TutorRouter::preferred_category(None), None);
        assert_eq!(TutorRouter::preferred_category(Some("auto")), None);
        assert_eq!(TutorRouter::preferred_category(Some("AUTO")), None);
        assert_eq!(TutorRouter::preferred_category(Some("")), None);
        assert_eq!(
            TutorRouter::preferred_category(Some("physics")),
            Some(Category::Physics)
        );
        assert_eq!(
            TutorRouter::preferred_category(Some("astrology")),
            Some(Category::General)
        );
    }

    #[test]
    fn test_validate_query() {
        let router = router(Arc::new(ScriptedModel::replying("ok")));
        assert!(router.validate_query("what is 2 + 2").is_ok());
        assert!(matches!(router.validate_query("   "), Err(Error::Validation(_))));
        let long = "a".repeat(router.config().max_query_chars + 1);
        assert!(matches!(router.validate_query(&long), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_new_conversation_for_arithmetic() {
        let model = Arc::new(ScriptedModel::replying("Add them."));
        let router = router(model);

        let reply = router.handle_query("2 + 2", None, None).await.unwrap();

        assert!(reply.response.contains("Result: 4"));
        assert_eq!(reply.specialist, Category::Math);
        assert_eq!(reply.status, ReplyStatus::Success);
        assert!(router.store().exists(reply.conversation_id));
        assert_eq!(router.store().history(reply.conversation_id, None).len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_conversation_is_rejected() {
        let model = Arc::new(ScriptedModel::replying("ok"));
        let router = router(model.clone());

        let err = router
            .handle_query("2 + 2", Some(Uuid::new_v4()), None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidConversation(_)));
        assert_eq!(model.calls(), 0);
        assert!(router.store().is_empty());
    }

    #[tokio::test]
    async fn test_unclassified_query_uses_general_tutor() {
        let model = Arc::new(ScriptedModel::replying_in_order(["unknown", "Happy to help."]));
        let router = router(model.clone());

        let reply = router.handle_query("tell me a story", None, None).await.unwrap();

        assert_eq!(reply.response, "Happy to help.");
        assert_eq!(reply.specialist, Category::General);
        let history = router.store().history(reply.conversation_id, None);
        assert_eq!(history[0].specialist, Some(Category::General));
        assert!(
            model
                .last_prompt()
                .unwrap()
                .starts_with("You are a helpful tutor.")
        );
    }

    #[tokio::test]
    async fn test_preferred_specialist_bypasses_classifier() {
        let model = Arc::new(ScriptedModel::replying("Covalent bonds share electrons."));
        let router = router(model.clone());

        let reply = router
            .handle_query("tell me about bonds", None, Some("chemistry"))
            .await
            .unwrap();

        assert_eq!(reply.specialist, Category::Chemistry);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_tool_failure_is_recorded() {
        let model = Arc::new(ScriptedModel::replying("unused"));
        let router = router(model.clone());

        let reply = router.handle_query("10 / 0", None, None).await.unwrap();

        assert_eq!(reply.status, ReplyStatus::ToolError);
        assert_eq!(reply.response, "Error: Division by zero");
        assert_eq!(model.calls(), 0);
        let history = router.store().history(reply.conversation_id, None);
        assert_eq!(history[0].response, "Error: Division by zero");
    }

    #[tokio::test]
    async fn test_general_prompt_uses_general_window() {
        let model = Arc::new(ScriptedModel::replying("fine"));
        let router = router(model.clone());
        let id = router.create_conversation(None);
        for n in 1..=4 {
            router.store().append(id, format!("q{n}"), format!("a{n}"), None).unwrap();
        }

        router.handle_query("hello there", Some(id), Some("general")).await.unwrap();

        let prompt = model.last_prompt().unwrap();
        assert!(prompt.contains("Q: q2"));
        assert!(!prompt.contains("Q: q1"));
    }

    #[test]
    fn test_from_config_applies_windows() {
        let mut config = Config::default();
        config.conversation.history_window = 7;
        config.conversation.max_query_chars = 10;

        let router = TutorRouter::from_config(&config, Arc::new(ScriptedModel::replying("ok")));

        assert_eq!(router.config().history_window, 7);
        assert!(router.validate_query("this is too long").is_err());
        assert_eq!(router.invoker().cache().ttl(), Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_pass_through_operations() {
        let router = router(Arc::new(ScriptedModel::replying("ok")));
        let id = router.create_conversation(Some("alice".to_string()));

        assert_eq!(router.list_conversations(Some("alice")).len(), 1);
        assert_eq!(router.conversation_info(id).unwrap().owner_id.as_deref(), Some("alice"));
        assert!(router.conversation_history(id, None).unwrap().is_empty());
        assert_eq!(router.evict_stale_conversations(), 0);
        assert!(router.delete_conversation(id));
        assert!(router.conversation_history(id, None).is_err());
    }
}
