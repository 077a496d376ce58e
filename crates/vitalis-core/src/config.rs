//! Orchestrator configuration.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where a free-text turn is answered.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Call the generation service directly, with cache and retry.
    #[default]
    Local,
    /// Send through the session transport to the server-side agent.
    ///
    /// Failed sends are retried like local calls. The server persists each
    /// exchange it answers, so a send that fails after the server wrote it
    /// (a timeout, say) leaves a duplicate entry in the transcript when the
    /// retry succeeds. Pagination shows both turns.
    Remote,
}

/// Tunables for the conversational core.
///
/// Every field has a default so a partial `config.toml` is valid.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Turns kept for generation history; the local store caps at twice this
    pub max_history: usize,
    /// Lifetime of cached generation results, in seconds
    pub cache_ttl_secs: u64,
    /// Total attempts per generation call, including the first
    pub retry_attempts: u32,
    /// Delay before the first retry, doubled after each failure
    pub retry_base_delay_ms: u64,
    /// Transcript entries per page
    pub page_size: u32,
    pub dispatch: DispatchMode,
    /// Shown when a session has no history yet
    pub greeting: String,
    /// Shown when a request fails after all retries
    pub error_message: String,
    /// Name for sessions created without one
    pub default_session_name: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_history: 20,
            cache_ttl_secs: 300,
            retry_attempts: 3,
            retry_base_delay_ms: 1000,
            page_size: 20,
            dispatch: DispatchMode::Local,
            greeting: "¡Hola! Soy tu compañero de bienestar. ¿En qué te ayudo hoy?".to_string(),
            error_message:
                "Lo siento, tuve un problema al responder. Inténtalo de nuevo o elige una opción del menú."
                    .to_string(),
            default_session_name: "Nueva conversación".to_string(),
        }
    }
}

impl OrchestratorConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Rejects values that would make the core misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.max_history == 0 {
            return Err(CoreError::config("max_history must be at least 1"));
        }
        if self.retry_attempts == 0 {
            return Err(CoreError::config("retry_attempts must be at least 1"));
        }
        if self.page_size == 0 {
            return Err(CoreError::config("page_size must be at least 1"));
        }
        if self.cache_ttl_secs == 0 {
            return Err(CoreError::config("cache_ttl_secs must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: OrchestratorConfig = toml::from_str(
            r#"
            max_history = 10
            dispatch = "remote"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_history, 10);
        assert_eq!(config.dispatch, DispatchMode::Remote);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = OrchestratorConfig {
            retry_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
