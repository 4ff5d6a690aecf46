//! Configuration service implementation.
//!
//! Loads [`NotechatConfig`] from `config.toml` and layers environment
//! overrides on top of it.

use crate::paths::NotechatPaths;
use notechat_core::config::NotechatConfig;
use notechat_core::error::{NotechatError, Result};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_MODEL_NAME: &str = "OPENAI_MODEL_NAME";
pub const ENV_STORAGE_DIR: &str = "NOTECHAT_STORAGE_DIR";

/// Configuration service that loads and caches the configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: NotechatPaths,
    /// Cached configuration, loaded lazily on first access.
    config: Arc<RwLock<Option<NotechatConfig>>>,
}

impl ConfigService {
    pub fn new(paths: NotechatPaths) -> Self {
        Self {
            paths,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn paths(&self) -> &NotechatPaths {
        &self.paths
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A missing or unreadable file yields the defaults.
    pub fn get_config(&self) -> NotechatConfig {
        if let Some(cached) = self
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return cached.clone();
        }

        let mut loaded = match self.load_file() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("[ConfigService] Using default configuration: {}", e);
                NotechatConfig::default()
            }
        };
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Directory of the file-backed key-value store.
    pub fn storage_dir(&self) -> PathBuf {
        self.get_config()
            .storage_dir
            .unwrap_or_else(|| self.paths.default_storage_dir())
    }

    fn load_file(&self) -> Result<NotechatConfig> {
        let path = self.paths.config_file();
        if !path.exists() {
            tracing::debug!("[ConfigService] No config file at {}", path.display());
            return Ok(NotechatConfig::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            NotechatError::io(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(toml::from_str(&content)?)
    }
}

/// Applies environment overrides. Empty values are ignored.
fn apply_env_overrides(config: &mut NotechatConfig, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if config.completion.api_key.is_none() {
        config.completion.api_key = lookup(ENV_OPENAI_API_KEY);
    }
    if let Some(model) = lookup(ENV_OPENAI_MODEL_NAME) {
        config.completion.model = model;
    }
    if let Some(dir) = lookup(ENV_STORAGE_DIR) {
        config.storage_dir = Some(PathBuf::from(dir));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notechat_core::config::CompletionProvider;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let service = ConfigService::new(NotechatPaths::with_base_dir(temp.path()));

        let config = service.load_file().unwrap();
        assert_eq!(config.completion.provider, CompletionProvider::Simulated);
        assert_eq!(config.dialog.min_messages_to_keep, 1);
    }

    #[test]
    fn test_loads_config_file() {
        let temp = TempDir::new().unwrap();
        let paths = NotechatPaths::with_base_dir(temp.path());
        std::fs::create_dir_all(paths.config_dir()).unwrap();
        std::fs::write(
            paths.config_file(),
            "storage_dir = \"/srv/notes\"\n[completion]\nprovider = \"openai\"\n",
        )
        .unwrap();

        let service = ConfigService::new(paths);
        let config = service.load_file().unwrap();
        assert_eq!(config.completion.provider, CompletionProvider::OpenAi);
        assert_eq!(config.storage_dir, Some(PathBuf::from("/srv/notes")));
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let paths = NotechatPaths::with_base_dir(temp.path());
        std::fs::create_dir_all(paths.config_dir()).unwrap();
        std::fs::write(paths.config_file(), "storage_dir = [").unwrap();

        let err = ConfigService::new(paths).load_file().unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = NotechatConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            ENV_OPENAI_API_KEY => Some("sk-test".to_string()),
            ENV_OPENAI_MODEL_NAME => Some("gpt-4o-mini".to_string()),
            ENV_STORAGE_DIR => Some("  ".to_string()),
            _ => None,
        });

        assert_eq!(config.completion.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.storage_dir, None);
    }

    #[test]
    fn test_configured_api_key_wins_over_env() {
        let mut config = NotechatConfig::default();
        config.completion.api_key = Some("from-file".to_string());
        apply_env_overrides(&mut config, |_| Some("from-env".to_string()));
        assert_eq!(config.completion.api_key.as_deref(), Some("from-file"));
    }
}
