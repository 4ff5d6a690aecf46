//! Application configuration model.
//!
//! Loaded from `config.toml` by the infrastructure layer; every field has a
//! default so a missing or partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default model identifier sent to the completion API.
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o";

/// Which completion backend answers chat messages.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompletionProvider {
    /// Canned replies after a fixed delay; needs no network access.
    #[default]
    Simulated,
    /// OpenAI chat completions API.
    OpenAi,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CompletionConfig {
    pub provider: CompletionProvider,
    pub model: String,
    /// API key; falls back to `OPENAI_API_KEY` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Delay before a simulated reply, in milliseconds.
    pub simulated_delay_ms: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: CompletionProvider::default(),
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            api_key: None,
            simulated_delay_ms: 500,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DialogConfig {
    /// Question dialogs closed with fewer exchanged messages are discarded.
    pub min_messages_to_keep: usize,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            min_messages_to_keep: 1,
        }
    }
}

/// Root configuration.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct NotechatConfig {
    /// Directory of the file-backed key-value store; platform data dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
    pub completion: CompletionConfig,
    pub dialog: DialogConfig,
}
