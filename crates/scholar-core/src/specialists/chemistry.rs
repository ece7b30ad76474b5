//! Chemistry specialist

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

static REACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9+\s]+\s*[-=]>\s*[A-Za-z0-9+\s]+").expect("valid regex")
});

static FORMULA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]?\d*(?:[A-Z][a-z]?\d*)*\b").expect("valid regex")
});

static CONCEPTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(periodic table|element|atom|electron|proton|neutron|orbital|bond|ionic|covalent|molecular|valence|ph|acid|base|solution|concentration|molarity|reaction|catalyst|equilibrium|thermodynamics)s?\b",
    )
    .expect("valid regex")
});

/// What kind of chemistry question a query is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChemistryTopic {
    Reaction,
    Compound,
    Concept,
    General,
}

/// Chooses a prompt by topic; every answer comes from the model
pub struct ChemistrySpecialist {
    invoker: Arc<ModelInvoker>,
}

impl ChemistrySpecialist {
    pub fn new(invoker: Arc<ModelInvoker>) -> Self {
        Self { invoker }
    }

    /// Chemical formulas mentioned in the query, e.g. `H2O`, `NaCl`
    ///
    /// A capitalized token only counts when it carries a digit or at least
    /// two element symbols, so ordinary capitalized words are skipped.
    pub fn formulas(query: &str) -> Vec<&str> {
        FORMULA
            .find_iter(query)
            .map(|m| m.as_str())
            .filter(|token| {
                token.chars().any(|c| c.is_ascii_digit())
                    || token.chars().filter(|c| c.is_ascii_uppercase()).count() >= 2
            })
            .collect()
    }

    pub fn topic(query: &str) -> ChemistryTopic {
        if REACTION.is_match(query) {
            ChemistryTopic::Reaction
        } else if !Self::formulas(query).is_empty() {
            ChemistryTopic::Compound
        } else if CONCEPTS.is_match(&query.to_lowercase()) {
            ChemistryTopic::Concept
        } else {
            ChemistryTopic::General
        }
    }

    /// Describe a chemical element by symbol
    pub async fn element_info(&self, symbol: &str) -> Result<String> {
        let prompt = format!(
            "Provide detailed information about the chemical element with symbol '{}':\n\
             - Full name\n\
             - Atomic number\n\
             - Atomic mass\n\
             - Electron configuration\n\
             - Common properties and uses\n\
             - Position in periodic table",
            symbol.trim()
        );
        self.invoker.invoke(&prompt).await
    }

    /// Walk through balancing a chemical equation
    pub async fn balance_equation(&self, equation: &str) -> Result<String> {
        let prompt = format!(
            "Help balance this chemical equation and explain the process step by step: {}\n\
             Show the balanced equation and explain the method used.",
            equation.trim()
        );
        self.invoker.invoke(&prompt).await
    }
}

fn preamble(topic: ChemistryTopic) -> &'static str {
    match topic {
        ChemistryTopic::Reaction => {
            "You are an expert chemistry tutor. The user has asked about a chemical equation or reaction.\n\
             Please provide a detailed explanation including:\n\
             1. The type of reaction\n\
             2. How to balance the equation (if needed)\n\
             3. Products and reactants\n\
             4. Any relevant chemical principles"
        }
        ChemistryTopic::Compound => {
            "You are an expert chemistry tutor. The user has asked about chemical compounds or formulas.\n\
             Please provide information about:\n\
             1. The chemical name and formula\n\
             2. Molecular structure and properties\n\
             3. Common uses or occurrence\n\
             4. Any relevant chemical concepts"
        }
        ChemistryTopic::Concept => {
            "You are an expert chemistry tutor. Please explain the chemistry concepts in this question clearly and thoroughly.\n\
             Include examples, relevant formulas, and step-by-step explanations where appropriate."
        }
        ChemistryTopic::General => {
            "You are an expert chemistry tutor. Please answer this chemistry-related question with clear explanations,\n\
             examples, and any relevant chemical principles or formulas."
        }
    }
}

#[async_trait]
impl Specialist for ChemistrySpecialist {
    fn category(&self) -> Category {
        Category::Chemistry
    }

    async fn handle_query(&self, query: &str, history: &[Interaction]) -> Answer {
        let topic = Self::topic(query);
        info!(topic = ?topic, "Processing chemistry query");

        let prompt = tutor_prompt(history, preamble(topic), query);
        Answer::from_model(self.invoker.invoke(&prompt).await)
    }
}
