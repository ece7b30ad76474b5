//! Math specialist

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use crate::conversation::Interaction;
use crate::llm::ModelInvoker;
use crate::routing::Category;
use crate::tools::{calculate, format_number, solve_equation};

use super::prompt::history_context;
use super::traits::{Answer, Specialist, explanation_or_error};

static EQUATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"solve.*=",
        r"\w+\s*[\^²³⁴⁵⁶⁷⁸⁹⁰]\s*\d*.*=",
        r"\w+\s*\*{2}\s*\d+.*=",
        r"x\s*=|y\s*=|z\s*=",
        r"\w+\s*[+\-]\s*\w+\s*=",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static EQUATION_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(solve|equations?|find\s+[xyz]\b)").expect("valid regex")
});

static ARITHMETIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\s*[+\-*/]\s*\d+").expect("valid regex"));

/// Solves equations and arithmetic locally, then asks the model to explain
pub struct MathSpecialist {
    invoker: Arc<ModelInvoker>,
}

impl MathSpecialist {
    pub fn new(invoker: Arc<ModelInvoker>) -> Self {
        Self { invoker }
    }

    /// Whether the query asks for an equation to be solved
    pub fn is_equation_request(query: &str) -> bool {
        let lowered = query.to_lowercase();
        EQUATION_PATTERNS.iter().any(|p| p.is_match(&lowered))
            || EQUATION_KEYWORDS.is_match(&lowered)
    }

    /// First two-operand arithmetic expression in the query
    pub fn arithmetic_expression(query: &str) -> Option<&str> {
        ARITHMETIC.find(query).map(|m| m.as_str())
    }

    async fn solve(&self, query: &str, history: &[Interaction]) -> Answer {
        info!("Detected equation to solve");
        let solution = match solve_equation(query) {
            Ok(solution) => solution,
            Err(e) => {
                warn!(error = %e, "Equation solver failed");
                return Answer::ToolFailed(e);
            }
        };

        let prompt = format!(
            "{}Explain how to solve this equation step by step: {}. Be clear and educational.",
            history_context(history),
            query
        );
        let explanation = explanation_or_error(self.invoker.invoke(&prompt).await);
        Answer::Ok(format!(
            "{}\n\nStep-by-step explanation: {}",
            solution, explanation
        ))
    }

    async fn compute(&self, expression: &str, history: &[Interaction]) -> Answer {
        info!(expression = %expression, "Found arithmetic expression");
        let result = match calculate(expression) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, expression = %expression, "Calculation failed");
                return Answer::ToolFailed(e);
            }
        };

        let prompt = format!(
            "{}Explain how to solve the arithmetic expression {}. Be clear and educational.",
            history_context(history),
            expression
        );
        let explanation = explanation_or_error(self.invoker.invoke(&prompt).await);
        Answer::Ok(format!(
            "Result: {}\nExplanation: {}",
            format_number(result),
            explanation
        ))
    }
}

#[async_trait]
impl Specialist for MathSpecialist {
    fn category(&self) -> Category {
        Category::Math
    }

    async fn handle_query(&self, query: &str, history: &[Interaction]) -> Answer {
        if Self::is_equation_request(query) {
            return self.solve(query, history).await;
        }

        if let Some(expression) = Self::arithmetic_expression(query) {
            return self.compute(expression, history).await;
        }

        info!("Processing general math query");
        let prompt = format!(
            "{}You are a math tutor. Please answer this math question: {}",
            history_context(history),
            query
        );
        Answer::from_model(self.invoker.invoke(&prompt).await)
    }
}
