//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Longest accepted conversation retention window
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Scholar configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(skip)]
    pub api_key: Option<String>,
    pub default_model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    /// 0 means unbounded
    pub max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Interactions handed to a specialist
    pub history_window: usize,
    /// Interactions used by the general tutor prompt
    pub general_window: usize,
    /// Interactions used by the model-backed classifier
    pub classifier_window: usize,
    pub retention_days: u32,
    pub max_query_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: "google/gemini-2.0-flash-001".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            timeout_secs: 60,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            max_entries: 0,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 2000,
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_window: 5,
            general_window: 3,
            classifier_window: 3,
            retention_days: 30,
            max_query_chars: 2000,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl LlmConfig {
    pub fn resolved_api_key(&self) -> anyhow::Result<Option<String>> {
        self.enforce_env_only()?;

        Ok(env::var("SCHOLAR_API_KEY")
            .or_else(|_| env::var("OPENROUTER_API_KEY"))
            .ok())
    }

    pub fn redacted_api_key(&self) -> anyhow::Result<Option<String>> {
        self.resolved_api_key()
            .map(|opt| opt.map(|key| redact_key(&key)))
    }

    pub fn enforce_env_only(&self) -> anyhow::Result<()> {
        if self.api_key.is_some() {
            return Err(anyhow!(
                "LLM API keys must be provided via environment variables, not stored in configuration"
            ));
        }
        Ok(())
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl ConversationConfig {
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("SCHOLAR_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("scholar")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or use defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.llm.enforce_env_only()?;
        if self.retry.max_retries == 0 {
            return Err(anyhow!("retry.max_retries must be at least 1"));
        }
        if self.conversation.max_query_chars == 0 {
            return Err(anyhow!("conversation.max_query_chars must be at least 1"));
        }
        if self.conversation.retention_days > MAX_RETENTION_DAYS {
            return Err(anyhow!(
                "conversation.retention_days must be at most {}",
                MAX_RETENTION_DAYS
            ));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            // LLM settings
            "llm.default_model" => Ok(self.llm.default_model.clone()),
            "llm.base_url" => Ok(self.llm.base_url.clone()),
            "llm.temperature" => Ok(self.llm.temperature.to_string()),
            "llm.max_tokens" => Ok(self.llm.max_tokens.to_string()),
            "llm.timeout_secs" => Ok(self.llm.timeout_secs.to_string()),

            // Cache settings
            "cache.ttl_secs" => Ok(self.cache.ttl_secs.to_string()),
            "cache.max_entries" => Ok(self.cache.max_entries.to_string()),

            // Retry settings
            "retry.max_retries" => Ok(self.retry.max_retries.to_string()),
            "retry.backoff_ms" => Ok(self.retry.backoff_ms.to_string()),

            // Conversation settings
            "conversation.history_window" => Ok(self.conversation.history_window.to_string()),
            "conversation.general_window" => Ok(self.conversation.general_window.to_string()),
            "conversation.classifier_window" => {
                Ok(self.conversation.classifier_window.to_string())
            }
            "conversation.retention_days" => Ok(self.conversation.retention_days.to_string()),
            "conversation.max_query_chars" => Ok(self.conversation.max_query_chars.to_string()),

            // Server settings
            "server.bind_address" => Ok(self.server.bind_address.clone()),
            "server.port" => Ok(self.server.port.to_string()),

            // API key (special handling - show redacted)
            "llm.api_key" | "api_key" => match self.llm.redacted_api_key()? {
                Some(redacted) => Ok(redacted),
                None => Ok(
                    "(not set - use SCHOLAR_API_KEY or OPENROUTER_API_KEY env var)".to_string(),
                ),
            },

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `scholar config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            // LLM settings
            "llm.default_model" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("Model identifier must not be empty"));
                }
                self.llm.default_model = value.to_string();
            }
            "llm.base_url" => {
                self.llm.base_url = value.trim_end_matches('/').to_string();
            }
            "llm.temperature" => {
                let temp: f32 = value
                    .parse()
                    .with_context(|| format!("Invalid temperature value: {}", value))?;
                if !(0.0..=2.0).contains(&temp) {
                    return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
                }
                self.llm.temperature = temp;
            }
            "llm.max_tokens" => {
                self.llm.max_tokens = value
                    .parse()
                    .with_context(|| format!("Invalid max_tokens value: {}", value))?;
            }
            "llm.timeout_secs" => {
                self.llm.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
            }

            // Cache settings
            "cache.ttl_secs" => {
                self.cache.ttl_secs = value
                    .parse()
                    .with_context(|| format!("Invalid ttl_secs value: {}", value))?;
            }
            "cache.max_entries" => {
                self.cache.max_entries = value
                    .parse()
                    .with_context(|| format!("Invalid max_entries value: {}", value))?;
            }

            // Retry settings
            "retry.max_retries" => {
                let retries: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_retries value: {}", value))?;
                if retries == 0 {
                    return Err(anyhow!("max_retries must be at least 1"));
                }
                self.retry.max_retries = retries;
            }
            "retry.backoff_ms" => {
                self.retry.backoff_ms = value
                    .parse()
                    .with_context(|| format!("Invalid backoff_ms value: {}", value))?;
            }

            // Conversation settings
            "conversation.history_window" => {
                self.conversation.history_window = parse_window(key, value)?;
            }
            "conversation.general_window" => {
                self.conversation.general_window = parse_window(key, value)?;
            }
            "conversation.classifier_window" => {
                self.conversation.classifier_window = parse_window(key, value)?;
            }
            "conversation.retention_days" => {
                let days: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid retention_days value: {}", value))?;
                if days > MAX_RETENTION_DAYS {
                    return Err(anyhow!("retention_days must be at most {}", MAX_RETENTION_DAYS));
                }
                self.conversation.retention_days = days;
            }
            "conversation.max_query_chars" => {
                let max: usize = value
                    .parse()
                    .with_context(|| format!("Invalid max_query_chars value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("max_query_chars must be at least 1"));
                }
                self.conversation.max_query_chars = max;
            }

            // Server settings
            "server.bind_address" => {
                self.server.bind_address = value.to_string();
            }
            "server.port" => {
                self.server.port = value
                    .parse()
                    .with_context(|| format!("Invalid port value: {}", value))?;
            }

            // API key cannot be set via config
            "llm.api_key" | "api_key" => {
                return Err(anyhow!(
                    "API keys cannot be stored in configuration for security. \
                     Set the SCHOLAR_API_KEY or OPENROUTER_API_KEY environment variable instead."
                ));
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `scholar config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "llm.default_model",
            "llm.base_url",
            "llm.temperature",
            "llm.max_tokens",
            "llm.timeout_secs",
            "llm.api_key",
            "cache.ttl_secs",
            "cache.max_entries",
            "retry.max_retries",
            "retry.backoff_ms",
            "conversation.history_window",
            "conversation.general_window",
            "conversation.classifier_window",
            "conversation.retention_days",
            "conversation.max_query_chars",
            "server.bind_address",
            "server.port",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

/// Mask all but the last four characters of a secret
fn redact_key(key: &str) -> String {
    let chars = key.chars().count();
    if chars <= 4 {
        return "***".to_string();
    }
    let suffix: String = key.chars().skip(chars - 4).collect();
    format!("***{}", suffix)
}

fn parse_window(key: &str, value: &str) -> anyhow::Result<usize> {
    let window: usize = value
        .parse()
        .with_context(|| format!("Invalid {} value: {}", key, value))?;
    if window > 50 {
        return Err(anyhow!("{} must be at most 50", key));
    }
    Ok(window)
}
