//! Cache-aware model invocation with bounded retry

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cache::{ResponseCache, fingerprint};
use crate::config::RetryConfig;
use crate::error::{Error, Result};

use super::ModelEndpoint;

/// Default number of attempts per logical call
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default fixed wait between attempts
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// Wraps a [`ModelEndpoint`] with a [`ResponseCache`] and fixed-interval retry
///
/// One invoker is shared by the classifier and every specialist. No cache
/// lock is held while the remote call is in flight; concurrent identical
/// prompts are not deduplicated and may both populate the cache.
pub struct ModelInvoker {
    endpoint: Arc<dyn ModelEndpoint>,
    cache: Arc<ResponseCache>,
    max_retries: u32,
    backoff: Duration,
}

impl std::fmt::Debug for ModelInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelInvoker")
            .field("model", &self.endpoint.model_identity())
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl ModelInvoker {
    /// Create an invoker with the default retry policy
    pub fn new(endpoint: Arc<dyn ModelEndpoint>, cache: Arc<ResponseCache>) -> Self {
        Self {
            endpoint,
            cache,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Apply a retry policy from config
    pub fn with_retry_config(self, config: &RetryConfig) -> Self {
        self.with_max_retries(config.max_retries)
            .with_backoff(config.backoff())
    }

    /// Set the number of attempts (at least one is always made)
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the fixed wait between attempts
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn model_identity(&self) -> &str {
        self.endpoint.model_identity()
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Run one logical model call
    ///
    /// Returns the cached response when a live entry exists. Otherwise makes
    /// up to `max_retries` attempts, sleeping `backoff` between them, and
    /// caches the first success. Failures are never cached.
    pub async fn invoke(&self, prompt: &str) -> Result<String> {
        let key = fingerprint(self.endpoint.model_identity(), prompt);

        if let Some(cached) = self.cache.get(&key) {
            debug!(model = %self.endpoint.model_identity(), "Serving model response from cache");
            return Ok(cached);
        }

        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            info!(
                attempt,
                max_retries = self.max_retries,
                model = %self.endpoint.model_identity(),
                "Calling model"
            );

            match self.endpoint.generate(prompt).await {
                Ok(response) => {
                    self.cache.set(key, response.clone());
                    return Ok(response);
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < self.max_retries {
                        warn!(
                            attempt,
                            error = %last_error,
                            backoff_ms = self.backoff.as_millis() as u64,
                            "Model call failed, retrying"
                        );
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }

        error!(
            attempts = self.max_retries,
            error = %last_error,
            "All model call attempts failed"
        );
        Err(Error::Upstream {
            attempts: self.max_retries,
            last_error,
        })
    }
}
