//! History specialist

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::info;

use crate::conversation::Interaction;
use crate::error::Result;
use crate::llm::ModelInvoker;
use crate::routing::Category;

use super::prompt::tutor_prompt;
use super::traits::{Answer, Specialist};

static PERIOD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b\d{1,4}\s*(ad|ce|bc|bce)\b",
        r"\b\d{4}s?\b",
        r"\b\d{1,2}(st|nd|rd|th)\s*century\b",
        r"\b(ancient|medieval|renaissance|modern|contemporary)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

const HISTORICAL_KEYWORDS: &[&str] = &[
    "war",
    "battle",
    "empire",
    "revolution",
    "civilization",
    "dynasty",
    "industrial revolution",
    "world war",
    "civil war",
    "independence",
    "conquest",
    "discovery",
    "pharaoh",
    "emperor",
    "king",
    "queen",
    "president",
    "dictator",
    "greek",
    "roman",
    "egyptian",
    "persian",
    "ottoman",
    "british",
    "american",
    "french",
    "russian",
    "chinese",
    "japanese",
];

const HISTORICAL_FIGURES: &[&str] = &[
    "caesar",
    "napoleon",
    "hitler",
    "stalin",
    "churchill",
    "roosevelt",
    "washington",
    "lincoln",
    "kennedy",
    "gandhi",
    "mandela",
    "cleopatra",
    "alexander",
    "hannibal",
    "marco polo",
    "columbus",
];

const GEOGRAPHY_TERMS: &[&str] = &[
    "country",
    "nation",
    "territory",
    "border",
    "map",
    "geography",
    "capital",
    "city",
    "continent",
    "region",
];

/// What kind of history question a query is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryTopic {
    Period,
    Event,
    Figure,
    Geography,
    General,
}

/// Chooses a prompt by topic; every answer comes from the model
pub struct HistorySpecialist {
    invoker: Arc<ModelInvoker>,
}

impl HistorySpecialist {
    pub fn new(invoker: Arc<ModelInvoker>) -> Self {
        Self { invoker }
    }

    pub fn topic(query: &str) -> HistoryTopic {
        let lowered = query.to_lowercase();

        if PERIOD_PATTERNS.iter().any(|p| p.is_match(&lowered)) {
            HistoryTopic::Period
        } else if mentions_any(&lowered, HISTORICAL_KEYWORDS) {
            HistoryTopic::Event
        } else if mentions_any(&lowered, HISTORICAL_FIGURES) {
            HistoryTopic::Figure
        } else if mentions_any(&lowered, GEOGRAPHY_TERMS) {
            HistoryTopic::Geography
        } else {
            HistoryTopic::General
        }
    }

    /// Chronological timeline for a topic, optionally bounded by years
    pub async fn timeline(
        &self,
        topic: &str,
        start_year: Option<i32>,
        end_year: Option<i32>,
    ) -> Result<String> {
        let range = match (start_year, end_year) {
            (Some(start), Some(end)) => format!(" from {} to {}", start, end),
            (Some(start), None) => format!(" starting from {}", start),
            (None, Some(end)) => format!(" up to {}", end),
            (None, None) => String::new(),
        };
        let prompt = format!(
            "Create a detailed timeline for {}{}.\n\
             Include major events, dates, and brief descriptions.\n\
             Format as a chronological list.",
            topic, range
        );
        self.invoker.invoke(&prompt).await
    }

    /// Compare and contrast two historical periods
    pub async fn compare_periods(&self, first: &str, second: &str) -> Result<String> {
        let prompt = format!(
            "Compare and contrast {} with {}.\n\
             Include:\n\
             1. Key characteristics of each period\n\
             2. Similarities and differences\n\
             3. Political, social, and cultural aspects\n\
             4. Technological and economic developments\n\
             5. Lasting impacts",
            first, second
        );
        self.invoker.invoke(&prompt).await
    }
}

/// Word-boundary match against a list of (possibly multi-word) terms
fn mentions_any(lowered: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| {
        lowered.match_indices(term).any(|(start, _)| {
            let end = start + term.len();
            let before = lowered[..start].chars().next_back();
            let after = lowered[end..].chars().next();
            // A trailing "s" still counts so plurals match
            !before.is_some_and(char::is_alphanumeric)
                && !after.is_some_and(|c| c.is_alphanumeric() && c != 's')
        })
    })
}

fn preamble(topic: HistoryTopic) -> &'static str {
    match topic {
        HistoryTopic::Period => {
            "You are an expert history tutor. The user has asked about a specific historical time period or date.\n\
             Please provide detailed information including:\n\
             1. Key events that occurred during this time\n\
             2. Important historical figures\n\
             3. Social, political, and cultural context\n\
             4. Significance and lasting impact"
        }
        HistoryTopic::Event => {
            "You are an expert history tutor. Please provide comprehensive information about this historical topic.\n\
             Include:\n\
             1. Background and context\n\
             2. Key events and timeline\n\
             3. Important people involved\n\
             4. Causes and consequences\n\
             5. Historical significance"
        }
        HistoryTopic::Figure => {
            "You are an expert history tutor. The user is asking about a historical figure.\n\
             Please provide detailed information including:\n\
             1. Biographical information (birth, death, background)\n\
             2. Major accomplishments and contributions\n\
             3. Historical context and time period\n\
             4. Legacy and impact on history\n\
             5. Interesting facts or anecdotes"
        }
        HistoryTopic::Geography => {
            "You are an expert history tutor. The user is asking about historical geography or geopolitics.\n\
             Please explain:\n\
             1. Historical development of the region/territory\n\
             2. Key events that shaped the geography\n\
             3. Political changes over time\n\
             4. Cultural and economic significance"
        }
        HistoryTopic::General => {
            "You are an expert history tutor. Please answer this historical question with:\n\
             1. Clear, accurate historical information\n\
             2. Proper historical context\n\
             3. Multiple perspectives when appropriate\n\
             4. Primary sources or evidence when relevant\n\
             5. Connections to broader historical themes"
        }
    }
}

#[async_trait]
impl Specialist for HistorySpecialist {
    fn category(&self) -> Category {
        Category::History
    }

    async fn handle_query(&self, query: &str, history: &[Interaction]) -> Answer {
        let topic = Self::topic(query);
        info!(topic = ?topic, "Processing history query");

        let prompt = tutor_prompt(history, preamble(topic), query);
        Answer::from_model(self.invoker.invoke(&prompt).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use crate::testing::ScriptedModel;
    use std::time::Duration;

    fn specialist(model: Arc<ScriptedModel>) -> HistorySpecialist {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
        HistorySpecialist::new(Arc::new(ModelInvoker::new(model, cache)))
    }

    #[test]
    fn test_topic_selection() {
        assert_eq!(HistorySpecialist::topic("Europe in the 1920s"), HistoryTopic::Period);
        assert_eq!(HistorySpecialist::topic("Rome in 44 BC"), HistoryTopic::Period);
        assert_eq!(
            HistorySpecialist::topic("life in the 15th century"),
            HistoryTopic::Period
        );
        assert_eq!(
            HistorySpecialist::topic("what caused World War 2"),
            HistoryTopic::Event
        );
        assert_eq!(HistorySpecialist::topic("who was Napoleon"), HistoryTopic::Figure);
        assert_eq!(
            HistorySpecialist::topic("how did the borders of Poland change"),
            HistoryTopic::Geography
        );
        assert_eq!(HistorySpecialist::topic("tell me a story"), HistoryTopic::General);
    }

    #[test]
    fn test_keywords_respect_word_boundaries() {
        assert!(!mentions_any("a software award", &["war"]));
        assert!(mentions_any("the wars of the roses", &["war"]));
        assert!(!mentions_any("a bitmap image", &["map"]));
    }

    #[tokio::test]
    async fn test_period_prompt() {
        let model = Arc::new(ScriptedModel::replying("The Jazz Age."));
        let history = specialist(model.clone());

        let answer = history.handle_query("Europe in the 1920s", &[]).await;

        assert_eq!(answer.render(), "The Jazz Age.");
        let prompt = model.last_prompt().unwrap();
        assert!(prompt.starts_with("You are an expert history tutor. The user has asked about a specific historical time period"));
        assert!(prompt.ends_with("Question: Europe in the 1920s"));
    }

    #[tokio::test]
    async fn test_timeline_ranges() {
        let model = Arc::new(ScriptedModel::replying("1914: ..."));
        let history = specialist(model.clone());

        history.timeline("World War I", Some(1914), Some(1918)).await.unwrap();
        assert!(
            model
                .last_prompt()
                .unwrap()
                .starts_with("Create a detailed timeline for World War I from 1914 to 1918.")
        );

        history.timeline("the Cold War", None, Some(1991)).await.unwrap();
        assert!(model.last_prompt().unwrap().contains("the Cold War up to 1991."));
    }

    #[tokio::test]
    async fn test_compare_periods() {
        let model = Arc::new(ScriptedModel::replying("Both were eras of change."));
        let history = specialist(model.clone());

        let text = history
            .compare_periods("the Renaissance", "the Enlightenment")
            .await
            .unwrap();

        assert_eq!(text, "Both were eras of change.");
        assert!(
            model
                .last_prompt()
                .unwrap()
                .starts_with("Compare and contrast the Renaissance with the Enlightenment.")
        );
    }
}
