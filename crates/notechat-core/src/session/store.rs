use super::model::{SessionState, Tab};
use crate::storage::{
    BackgroundWriter, KeyValueStore, SESSION_LAST_PATH_KEY, SESSION_MARKDOWN_KEY,
};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

/// Tracks the loaded document and the viewer's transient state.
///
/// Only the markdown document is persisted, through a fire-and-forget
/// background write under `@session_markdown`.
pub struct SessionStore {
    state: RwLock<SessionState>,
    storage: Arc<dyn KeyValueStore>,
    writer: BackgroundWriter<String>,
}

impl SessionStore {
    /// Creates an empty session backed by `storage`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let write_storage = storage.clone();
        let writer = BackgroundWriter::spawn("session", move |markdown: String| {
            let storage = write_storage.clone();
            async move { storage.set(SESSION_MARKDOWN_KEY, &markdown).await }
        });

        Self {
            state: RwLock::new(SessionState::default()),
            storage,
            writer,
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn markdown(&self) -> Option<String> {
        self.state().markdown
    }

    pub fn active_tab(&self) -> Tab {
        self.state().active_tab
    }

    pub fn highlight_context(&self) -> Option<String> {
        self.state().highlight_context
    }

    /// Replaces the current document and queues it for persistence.
    ///
    /// Empty documents replace the in-memory copy but are not written.
    pub fn set_markdown(&self, markdown: impl Into<String>) {
        let markdown = markdown.into();
        tracing::debug!("[SessionStore] set_markdown: {} bytes", markdown.len());

        let persist = !markdown.is_empty();
        let mut state = self.write();
        state.markdown = Some(markdown.clone());
        if persist {
            self.writer.submit(markdown);
        }
        drop(state);
    }

    /// Buffers highlighted text for the next question.
    ///
    /// Does not navigate; callers switch tabs explicitly. An empty string
    /// clears the buffer.
    pub fn set_highlight_context(&self, text: impl Into<String>) {
        let text = text.into();
        self.write().highlight_context = if text.is_empty() { None } else { Some(text) };
    }

    /// Returns the buffered highlight and clears it.
    pub fn take_highlight_context(&self) -> Option<String> {
        self.write().highlight_context.take()
    }

    pub fn set_active_tab(&self, tab: Tab) {
        tracing::debug!("[SessionStore] set_active_tab: {}", tab.as_str());
        self.write().active_tab = tab;
    }

    /// Loads the persisted document into the session.
    ///
    /// An absent document, or a failed read, leaves the markdown unset; the
    /// caller is then expected to load a default document.
    pub async fn load_from_storage(&self) -> Option<String> {
        let loaded = match self.storage.get(SESSION_MARKDOWN_KEY).await {
            Ok(Some(markdown)) if !markdown.is_empty() => Some(markdown),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("[SessionStore] Failed to load session from storage: {}", e);
                None
            }
        };

        self.write().markdown = loaded.clone();
        loaded
    }

    /// Remembers the path of the last opened document (best effort).
    pub async fn save_last_session_path(&self, path: &str) {
        if let Err(e) = self.storage.set(SESSION_LAST_PATH_KEY, path).await {
            tracing::warn!("[SessionStore] Failed to save last session path: {}", e);
        }
    }

    /// Returns the path of the last opened document, if one was saved.
    pub async fn last_session_path(&self) -> Option<String> {
        match self.storage.get(SESSION_LAST_PATH_KEY).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("[SessionStore] Failed to get last session path: {}", e);
                None
            }
        }
    }

    /// Waits until every queued document write has completed.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NotechatError, Result};
    use std::collections::HashMap;
    use std::sync::Mutex;

    // Mock KeyValueStore for testing
    #[derive(Default)]
    struct MockKeyValueStore {
        values: Mutex<HashMap<String, String>>,
        fail: bool,
    }

    impl MockKeyValueStore {
        fn failing() -> Self {
            Self {
                values: Mutex::new(HashMap::new()),
                fail: true,
            }
        }
    }

    #[async_trait::async_trait]
    impl KeyValueStore for MockKeyValueStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            if self.fail {
                return Err(NotechatError::storage("unavailable"));
            }
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.fail {
                return Err(NotechatError::storage("unavailable"));
            }
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }

        async fn clear(&self) -> Result<()> {
            self.values.lock().unwrap().clear();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_defaults() {
        let session = SessionStore::new(Arc::new(MockKeyValueStore::default()));
        assert_eq!(session.state(), SessionState::default());
        assert_eq!(session.active_tab(), Tab::Markdown);
    }

    #[tokio::test]
    async fn test_set_markdown_persists_raw_text() {
        let storage = Arc::new(MockKeyValueStore::default());
        let session = SessionStore::new(storage.clone());

        session.set_markdown("# Title\n\nBody");
        session.flush().await;

        assert_eq!(session.markdown().as_deref(), Some("# Title\n\nBody"));
        assert_eq!(
            storage.get(SESSION_MARKDOWN_KEY).await.unwrap().as_deref(),
            Some("# Title\n\nBody")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_documents_persist_latest() {
        let storage = Arc::new(MockKeyValueStore::default());
        let session = SessionStore::new(storage.clone());

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let session = &session;
                scope.spawn(move || {
                    for n in 0..50 {
                        session.set_markdown(format!("# Doc {worker}-{n}"));
                    }
                });
            }
        });
        session.flush().await;

        assert_eq!(
            storage.get(SESSION_MARKDOWN_KEY).await.unwrap(),
            session.markdown()
        );
    }

    #[tokio::test]
    async fn test_load_from_storage_restores_document() {
        let storage = Arc::new(MockKeyValueStore::default());
        storage.set(SESSION_MARKDOWN_KEY, "# Saved").await.unwrap();

        let session = SessionStore::new(storage);
        assert_eq!(session.load_from_storage().await.as_deref(), Some("# Saved"));
        assert_eq!(session.markdown().as_deref(), Some("# Saved"));
    }

    #[tokio::test]
    async fn test_load_from_storage_absent_leaves_markdown_unset() {
        let session = SessionStore::new(Arc::new(MockKeyValueStore::default()));
        assert_eq!(session.load_from_storage().await, None);
        assert_eq!(session.markdown(), None);
    }

    #[tokio::test]
    async fn test_failed_read_is_treated_as_absent() {
        let session = SessionStore::new(Arc::new(MockKeyValueStore::failing()));
        assert_eq!(session.load_from_storage().await, None);
        assert_eq!(session.last_session_path().await, None);

        // Writes fail silently as well.
        session.set_markdown("text");
        session.save_last_session_path("/notes/a.md").await;
        session.flush().await;
        assert_eq!(session.markdown().as_deref(), Some("text"));
    }

    #[tokio::test]
    async fn test_highlight_does_not_switch_tab() {
        let session = SessionStore::new(Arc::new(MockKeyValueStore::default()));

        session.set_highlight_context("let x = 1;");

        assert_eq!(session.highlight_context().as_deref(), Some("let x = 1;"));
        assert_eq!(session.active_tab(), Tab::Markdown);
    }

    #[tokio::test]
    async fn test_take_highlight_consumes_it() {
        let session = SessionStore::new(Arc::new(MockKeyValueStore::default()));
        session.set_highlight_context("selected");

        assert_eq!(session.take_highlight_context().as_deref(), Some("selected"));
        assert_eq!(session.take_highlight_context(), None);
    }

    #[tokio::test]
    async fn test_last_session_path_round_trip() {
        let session = SessionStore::new(Arc::new(MockKeyValueStore::default()));
        session.save_last_session_path("/notes/today.md").await;
        assert_eq!(
            session.last_session_path().await.as_deref(),
            Some("/notes/today.md")
        );
    }

    #[test]
    fn test_tab_toggle() {
        assert_eq!(Tab::Markdown.toggled(), Tab::Chatbot);
        assert_eq!(Tab::Chatbot.toggled(), Tab::Markdown);
    }
}
