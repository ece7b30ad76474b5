//! Keyword classifier with model fallback

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{info, warn};

use crate::conversation::Interaction;
use crate::llm::ModelInvoker;
use crate::specialists::history_context;

use super::types::Category;

/// Default number of interactions shown to the model classifier
pub const DEFAULT_CLASSIFIER_WINDOW: usize = 3;

/// Symbol keywords matched as plain substrings
const MATH_SYMBOLS: &[&str] = &["x =", "+", "-", "*", "/"];

const MATH_WORDS: &[&str] = &[
    "solve",
    "calculate",
    "equation",
    "math",
    "mathematic",
    "mathematical",
    "algebra",
    "arithmetic",
    "derivative",
    "integral",
    "matrix",
    "geometry",
];

const PHYSICS_WORDS: &[&str] = &[
    "newton",
    "force",
    "speed of light",
    "gravity",
    "physics",
    "velocity",
    "acceleration",
    "energy",
    "momentum",
    "wave",
    "quantum",
    "relativity",
];

const CHEMISTRY_WORDS: &[&str] = &[
    "chemistry",
    "chemical",
    "molecule",
    "molecular",
    "atom",
    "atomic",
    "element",
    "compound",
    "reaction",
    "periodic table",
    "bond",
    "ph",
    "acid",
    "base",
    "solution",
    "catalyst",
    "equilibrium",
];

const HISTORY_WORDS: &[&str] = &[
    "history",
    "historical",
    "historian",
    "war",
    "battle",
    "empire",
    "revolution",
    "ancient",
    "medieval",
    "renaissance",
    "century",
    "civilization",
    "king",
    "queen",
    "president",
    "napoleon",
    "caesar",
];

/// Word-boundary regex for a keyword list, allowing a plural `s`
///
/// Words match whole, so derived forms ("mathematics", "atomic") need their
/// own entries; "award" does not count as "war".
fn keyword_regex(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{})s?\b", alternation)).expect("valid regex")
}

/// Keyword sets in priority order; the first set with a match wins
static KEYWORD_SETS: LazyLock<[(Category, Regex); 4]> = LazyLock::new(|| {
    [
        (Category::Math, keyword_regex(MATH_WORDS)),
        (Category::Physics, keyword_regex(PHYSICS_WORDS)),
        (Category::Chemistry, keyword_regex(CHEMISTRY_WORDS)),
        (Category::History, keyword_regex(HISTORY_WORDS)),
    ]
});

/// Assigns a query to a subject
///
/// Keyword sets are checked in a fixed order (math, physics, chemistry,
/// history), so a query mentioning both "energy" and "reaction" is physics.
/// That order decides overlaps and is a known source of misrouting. Queries
/// with no keyword match are classified by the model.
#[derive(Debug, Clone)]
pub struct Classifier {
    invoker: Arc<ModelInvoker>,
    window: usize,
}

impl Classifier {
    pub fn new(invoker: Arc<ModelInvoker>) -> Self {
        Self {
            invoker,
            window: DEFAULT_CLASSIFIER_WINDOW,
        }
    }

    /// Set how many recent interactions the model sees
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Classify by keywords only
    pub fn match_keywords(query: &str) -> Option<Category> {
        let lowered = query.to_lowercase();

        if MATH_SYMBOLS.iter().any(|s| lowered.contains(s)) {
            return Some(Category::Math);
        }
        KEYWORD_SETS
            .iter()
            .find(|(_, regex)| regex.is_match(&lowered))
            .map(|(category, _)| *category)
    }

    /// Classify a query, consulting the model when no keyword matches
    ///
    /// Never fails: an unusable model reply or a failed call yields
    /// [`Category::Unknown`].
    pub async fn classify(&self, query: &str, history: &[Interaction]) -> Category {
        if let Some(category) = Self::match_keywords(query) {
            info!(category = %category, "Query classified by keywords");
            return category;
        }

        let start = history.len().saturating_sub(self.window);
        let prompt = format!(
            "{}Classify this query into exactly one of these categories: \
             'math', 'physics', 'chemistry', 'history', or 'unknown'. \
             Reply with the category name only.\n\nQuery: {}",
            history_context(&history[start..]),
            query
        );

        match self.invoker.invoke(&prompt).await {
            Ok(reply) => {
                let category = parse_model_label(&reply);
                info!(category = %category, reply = %reply.trim(), "Query classified by model");
                category
            }
            Err(e) => {
                warn!(error = %e, "Model classification failed, treating query as unknown");
                Category::Unknown
            }
        }
    }
}

/// Normalize a model reply into a category
fn parse_model_label(reply: &str) -> Category {
    let label = reply
        .trim()
        .to_lowercase()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`'))
        .trim_end_matches('.')
        .trim()
        .to_string();

    match label.parse::<Category>() {
        Ok(category) if category.has_specialist() => category,
        _ => Category::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use crate::testing::ScriptedModel;
    use std::time::Duration;

    fn classifier(model: Arc<ScriptedModel>) -> Classifier {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
        Classifier::new(Arc::new(ModelInvoker::new(model, cache).with_max_retries(2)))
    }

    #[test]
    fn test_keyword_classification() {
        assert_eq!(
            Classifier::match_keywords("solve 2x + 3 = 7"),
            Some(Category::Math)
        );
        assert_eq!(
            Classifier::match_keywords("what caused World War 2"),
            Some(Category::History)
        );
        assert_eq!(
            Classifier::match_keywords("speed of light in physics"),
            Some(Category::Physics)
        );
        assert_eq!(
            Classifier::match_keywords("what is an acid"),
            Some(Category::Chemistry)
        );
        assert_eq!(Classifier::match_keywords("tell me about dolphins"), None);
    }

    #[test]
    fn test_derived_word_forms_match() {
        assert_eq!(
            Classifier::match_keywords("What is mathematics?"),
            Some(Category::Math)
        );
        assert_eq!(
            Classifier::match_keywords("atomic number of carbon"),
            Some(Category::Chemistry)
        );
        assert_eq!(
            Classifier::match_keywords("ask a historian about it"),
            Some(Category::History)
        );
        assert_eq!(Classifier::match_keywords("who won the award"), None);
    }

    #[test]
    fn test_priority_order_resolves_overlaps() {
        assert_eq!(
            Classifier::match_keywords("energy released in a reaction"),
            Some(Category::Physics)
        );
        assert_eq!(
            Classifier::match_keywords("calculate the century"),
            Some(Category::Math)
        );
    }

    #[test]
    fn test_alphabetic_keywords_need_word_boundaries() {
        // "ph" must not match inside "photosynthesis", "war" not inside "award"
        assert_eq!(Classifier::match_keywords("describe photosynthesis"), None);
        assert_eq!(Classifier::match_keywords("who won the award"), None);
        assert_eq!(
            Classifier::match_keywords("what is the ph of water"),
            Some(Category::Chemistry)
        );
    }

    #[test]
    fn test_parse_model_label() {
        assert_eq!(parse_model_label("chemistry"), Category::Chemistry);
        assert_eq!(parse_model_label("  \"History\".\n"), Category::History);
        assert_eq!(parse_model_label("'math'"), Category::Math);
        assert_eq!(parse_model_label("unknown"), Category::Unknown);
        assert_eq!(parse_model_label("general"), Category::Unknown);
        assert_eq!(parse_model_label("I think it is biology"), Category::Unknown);
    }

    #[tokio::test]
    async fn test_model_fallback() {
        let model = Arc::new(ScriptedModel::replying("chemistry"));
        let classifier = classifier(model.clone());

        let category = classifier.classify("tell me about table salt", &[]).await;

        assert_eq!(category, Category::Chemistry);
        assert_eq!(model.calls(), 1);
        assert!(model.last_prompt().unwrap().ends_with("Query: tell me about table salt"));
    }

    #[tokio::test]
    async fn test_gibberish_is_unknown() {
        let model = Arc::new(ScriptedModel::replying("unknown"));
        let classifier = classifier(model);

        assert_eq!(classifier.classify("qwzx blorp", &[]).await, Category::Unknown);
    }

    #[tokio::test]
    async fn test_keyword_match_skips_model() {
        let model = Arc::new(ScriptedModel::replying("history"));
        let classifier = classifier(model.clone());

        assert_eq!(classifier.classify("2 * 8", &[]).await, Category::Math);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_call_degrades_to_unknown() {
        let model = Arc::new(ScriptedModel::always_failing("rate limited"));
        let classifier = classifier(model.clone());

        assert_eq!(classifier.classify("tell me a story", &[]).await, Category::Unknown);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_prompt_uses_last_window_of_history() {
        let model = Arc::new(ScriptedModel::replying("history"));
        let classifier = classifier(model.clone()).with_window(2);
        let history: Vec<_> = (1..=4)
            .map(|n| Interaction::new(format!("q{n}"), format!("a{n}"), None))
            .collect();

        classifier.classify("and then what happened", &history).await;

        let prompt = model.last_prompt().unwrap();
        assert!(prompt.starts_with("Previous conversation:\nQ: q3\nA: a3\nQ: q4\nA: a4\n\n"));
        assert!(!prompt.contains("q2"));
    }
}
