//! Test doubles for the model endpoint
//!
//! [`ScriptedModel`] replays a fixed script of outcomes, records every
//! prompt it receives and counts calls, so tests can assert both what was
//! asked and how often.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::llm::ModelEndpoint;

/// Identity reported by [`ScriptedModel`]
pub const SCRIPTED_MODEL_ID: &str = "scripted/test-model";

/// A model stub that replays scripted outcomes
///
/// Scripted outcomes are consumed in order; once the script is empty the
/// fallback outcome is returned for every further call.
pub struct ScriptedModel {
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    fallback: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn with_fallback(fallback: std::result::Result<String, String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always reply with `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_fallback(Ok(text.into()))
    }

    /// Always fail with `message`
    pub fn always_failing(message: impl Into<String>) -> Self {
        Self::with_fallback(Err(message.into()))
    }

    /// Fail `failures` times, then reply with `text`
    pub fn failing_then(text: impl Into<String>, failures: usize) -> Self {
        let model = Self::replying(text);
        if let Ok(mut script) = model.script.lock() {
            for n in 1..=failures {
                script.push_back(Err(format!("transient failure #{}", n)));
            }
        }
        model
    }

    /// Reply with each of `replies` in turn, then with the last one forever
    pub fn replying_in_order<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let replies: Vec<String> = replies.into_iter().map(Into::into).collect();
        let fallback = replies.last().cloned().unwrap_or_default();
        let model = Self::replying(fallback);
        if let Ok(mut script) = model.script.lock() {
            script.extend(replies.into_iter().map(Ok));
        }
        model
    }

    /// Number of `generate` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// The most recent prompt, if any
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts().pop()
    }
}

#[async_trait]
impl ModelEndpoint for ScriptedModel {
    fn model_identity(&self) -> &str {
        SCRIPTED_MODEL_ID
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone());

        next.map_err(Error::LLMError)
    }
}
