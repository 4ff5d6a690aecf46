//! Completion clients for notechat.

pub mod openai_completion_client;
pub mod simulated_completion_client;

pub use openai_completion_client::OpenAiCompletionClient;
pub use simulated_completion_client::{SIMULATED_REPLY, SimulatedCompletionClient};

use notechat_core::completion::CompletionClient;
use notechat_core::config::{CompletionConfig, CompletionProvider};
use notechat_core::error::{NotechatError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builds the completion client selected by `config`.
///
/// The OpenAI provider requires an API key, either configured or
/// from `OPENAI_API_KEY`.
pub fn create_completion_client(config: &CompletionConfig) -> Result<Arc<dyn CompletionClient>> {
    match config.provider {
        CompletionProvider::Simulated => Ok(Arc::new(SimulatedCompletionClient::new(
            Duration::from_millis(config.simulated_delay_ms),
        ))),
        CompletionProvider::OpenAi => {
            let client = match config.api_key.as_deref() {
                Some(key) if !key.trim().is_empty() => OpenAiCompletionClient::new(key),
                _ => OpenAiCompletionClient::try_from_env().map_err(|_| {
                    NotechatError::config(
                        "The openai provider needs completion.api_key or OPENAI_API_KEY",
                    )
                })?,
            };
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_is_default() {
        let client = create_completion_client(&CompletionConfig::default()).unwrap();
        assert_eq!(client.name(), "simulated");
    }

    #[test]
    fn test_openai_with_configured_key() {
        let config = CompletionConfig {
            provider: CompletionProvider::OpenAi,
            api_key: Some("sk-test".to_string()),
            ..CompletionConfig::default()
        };
        let client = create_completion_client(&config).unwrap();
        assert_eq!(client.name(), "openai");
    }
}
