//! Unified path management for notechat files.
//!
//! This ensures consistency across all platforms (Linux, macOS, Windows).

use notechat_core::error::{NotechatError, Result};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "notechat";

/// Unified path management for notechat.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/notechat/          # Config directory
/// └── config.toml              # Application configuration
///
/// ~/.local/share/notechat/     # Data directory
/// ├── store/                   # Key-value store (one file per key)
/// └── logs/                    # Application logs
///     └── notechat.log.YYYY-MM-DD
/// ```
#[derive(Debug, Clone)]
pub struct NotechatPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl NotechatPaths {
    /// Resolves the platform directories for notechat.
    pub fn resolve() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| NotechatError::config("Cannot find config directory"))?
            .join(APP_DIR_NAME);
        let data_dir = dirs::data_dir()
            .ok_or_else(|| NotechatError::config("Cannot find data directory"))?
            .join(APP_DIR_NAME);

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Roots every path under `base`. Used by tests.
    pub fn with_base_dir(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            config_dir: base.join("config"),
            data_dir: base.join("data"),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the path to `config.toml`.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Default directory of the file-backed key-value store.
    pub fn default_storage_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }

    /// Returns the logs directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_under_base_dir() {
        let paths = NotechatPaths::with_base_dir("/tmp/nc");
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/nc/config/config.toml"));
        assert_eq!(paths.default_storage_dir(), PathBuf::from("/tmp/nc/data/store"));
        assert_eq!(paths.logs_dir(), PathBuf::from("/tmp/nc/data/logs"));
    }
}
