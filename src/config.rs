//! Runtime configuration read from the environment

use crate::error::AssistantError;
use crate::Result;
use std::env;
use std::time::Duration;

pub const DEFAULT_COMPLETION_URL: &str = "https://api.x.ai/v1/chat/completions";
pub const DEFAULT_COMPLETION_MODEL: &str = "grok-2";
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PORT: u16 = 8080;

/// Settings for the external chat-completion endpoint
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_url: String,
    /// Bearer token. `None` leaves the fallback adapter permanently on its default reply.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_COMPLETION_URL.to_string(),
            api_key: None,
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub completion: CompletionConfig,
    pub port: u16,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            completion: CompletionConfig::default(),
            port: DEFAULT_PORT,
        }
    }
}

impl AssistantConfig {
    /// Build from process environment. Call `dotenv::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = match non_empty("COMPLETION_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    AssistantError::Configuration(format!(
                        "COMPLETION_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                        raw
                    ))
                })?;
                if secs == 0 {
                    return Err(AssistantError::Configuration(
                        "COMPLETION_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_COMPLETION_TIMEOUT,
        };

        let port: u16 = match non_empty("PORT").or_else(|| non_empty("API_PORT")) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                AssistantError::Configuration(format!("PORT must be a valid port, got '{}'", raw))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            completion: CompletionConfig {
                api_url: non_empty("GROK_API_URL")
                    .unwrap_or_else(|| DEFAULT_COMPLETION_URL.to_string()),
                api_key: non_empty("GROK_API_KEY"),
                model: non_empty("GROK_MODEL")
                    .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
                timeout,
            },
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AssistantConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AssistantConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.completion.api_url, DEFAULT_COMPLETION_URL);
        assert_eq!(config.completion.model, "grok-2");
        assert_eq!(config.completion.timeout, Duration::from_secs(10));
        assert!(config.completion.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("GROK_API_KEY", "secret"),
            ("GROK_MODEL", "grok-beta"),
            ("COMPLETION_TIMEOUT_SECS", "3"),
            ("API_PORT", "9000"),
        ])
        .unwrap();

        assert_eq!(config.completion.api_key.as_deref(), Some("secret"));
        assert_eq!(config.completion.model, "grok-beta");
        assert_eq!(config.completion.timeout, Duration::from_secs(3));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_port_prefers_port_over_api_port() {
        let config = config_from(&[("PORT", "7000"), ("API_PORT", "9000")]).unwrap();
        assert_eq!(config.port, 7000);
    }

    #[test]
    fn test_blank_key_is_unset() {
        let config = config_from(&[("GROK_API_KEY", "  ")]).unwrap();
        assert!(config.completion.api_key.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("PORT", "eighty")]),
            Err(AssistantError::Configuration(_))
        ));
        assert!(matches!(
            config_from(&[("COMPLETION_TIMEOUT_SECS", "0")]),
            Err(AssistantError::Configuration(_))
        ));
        assert!(matches!(
            config_from(&[("COMPLETION_TIMEOUT_SECS", "soon")]),
            Err(AssistantError::Configuration(_))
        ));
    }
}
