//! Chat preamble configuration.

use serde::{Deserialize, Serialize};

/// Preamble text injected ahead of every reconstructed transcript.
///
/// Loaded from the environment in deployments; the defaults match the
/// shipped configuration and keep tests hermetic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Developer/system instruction sent as the first transcript entry.
    pub prompt: String,
    /// Canned assistant greeting sent as the second transcript entry.
    pub initial_message: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            prompt: "You are a helpful assistant. Your goal is to help the user \
                     with whatever queries they have."
                .to_string(),
            initial_message: "Hello! How can I help you today?".to_string(),
        }
    }
}

impl ChatConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                      |
    /// |------------------------|------------------------------|
    /// | `CHAT_PROMPT`          | the shipped system prompt    |
    /// | `CHAT_INITIAL_MESSAGE` | `Hello! How can I help you today?` |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            prompt: std::env::var("CHAT_PROMPT").unwrap_or(defaults.prompt),
            initial_message: std::env::var("CHAT_INITIAL_MESSAGE")
                .unwrap_or(defaults.initial_message),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_non_empty() {
        let config = ChatConfig::default();
        assert!(config.prompt.contains("helpful assistant"));
        assert_eq!(config.initial_message, "Hello! How can I help you today?");
    }

    #[test]
    fn from_env_falls_back_to_defaults() {
        // Neither variable is set in the test environment.
        let config = ChatConfig::from_env();
        assert_eq!(config.prompt, ChatConfig::default().prompt);
        assert_eq!(
            config.initial_message,
            ChatConfig::default().initial_message
        );
    }
}
