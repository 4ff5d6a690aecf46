//! File-backed key-value store.
//!
//! Each key is stored in its own `<encoded key>.kv` file. Writes go to a
//! temporary file that is fsynced and then renamed over the target, so a
//! reader sees either the previous value or the new one, never a torn write.

use async_trait::async_trait;
use notechat_core::error::{NotechatError, Result};
use notechat_core::storage::KeyValueStore;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const VALUE_EXTENSION: &str = "kv";

#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", encode_key(key), VALUE_EXTENSION))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.root.join(format!(".{}.tmp", encode_key(key)))
    }

    async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            NotechatError::io(format!(
                "Failed to create storage directory '{}': {}",
                self.root.display(),
                e
            ))
        })
    }
}

/// Percent-encodes every byte outside `[A-Za-z0-9_-]` so any key maps to a
/// portable file name.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.') && name.ends_with(".tmp"))
}

async fn replace_via_temp(tmp_path: &Path, target: &Path, value: &str) -> std::io::Result<()> {
    let mut tmp_file = fs::File::create(tmp_path).await?;
    tmp_file.write_all(value.as_bytes()).await?;
    tmp_file.sync_all().await?;
    drop(tmp_file);
    fs::rename(tmp_path, target).await
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.value_path(key);
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(NotechatError::io(format!(
                "Failed to read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_root().await?;

        let tmp_path = self.temp_path(key);
        if let Err(e) = replace_via_temp(&tmp_path, &self.value_path(key), value).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        tracing::debug!("[FileKeyValueStore] Wrote key '{}'", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.value_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            // Leftover temp files come from writes interrupted before the rename.
            if path.extension().is_some_and(|ext| ext == VALUE_EXTENSION) || is_temp_file(&path) {
                fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }
}
