//! Shared prompt fragments

use crate::conversation::{Interaction, format_interactions};

/// `Previous conversation:` block for a prompt, empty without history
pub fn history_context(history: &[Interaction]) -> String {
    if history.is_empty() {
        return String::new();
    }
    format!("Previous conversation:\n{}\n\n", format_interactions(history))
}

/// A tutor prompt of the form `<context><preamble>\n\nQuestion: <query>`
pub fn tutor_prompt(history: &[Interaction], preamble: &str, query: &str) -> String {
    format!("{}{}\n\nQuestion: {}", history_context(history), preamble, query)
}
