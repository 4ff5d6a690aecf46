//! Application startup: rehydrate the stores and wire the services together.

use crate::chat_service::ChatService;
use crate::selection::SelectionFlow;
use notechat_core::completion::CompletionClient;
use notechat_core::config::NotechatConfig;
use notechat_core::conversation::{ConversationStore, ConversationType};
use notechat_core::session::SessionStore;
use notechat_core::storage::KeyValueStore;
use notechat_infrastructure::KvConversationRepository;
use notechat_infrastructure::sample::load_sample_markdown;
use std::sync::Arc;

/// The running application's stores and services.
pub struct Notechat {
    pub conversations: Arc<ConversationStore>,
    pub session: Arc<SessionStore>,
    pub chat: Arc<ChatService>,
    pub selection: SelectionFlow,
}

impl Notechat {
    /// Waits until every queued write of both stores has completed.
    pub async fn flush(&self) {
        self.conversations.flush().await;
        self.session.flush().await;
    }
}

/// Builds the application on top of `storage`.
///
/// Must be called from within a tokio runtime.
pub async fn bootstrap(
    storage: Arc<dyn KeyValueStore>,
    completion: Arc<dyn CompletionClient>,
    config: &NotechatConfig,
) -> Notechat {
    let repository = Arc::new(KvConversationRepository::new(storage.clone()));
    let conversations = Arc::new(ConversationStore::rehydrate(repository).await);
    ensure_default_conversation(&conversations);

    let session = Arc::new(SessionStore::new(storage));
    if session.load_from_storage().await.is_none() {
        tracing::info!("[Bootstrap] No saved session, loading sample document");
        session.set_markdown(load_sample_markdown());
    }

    let chat = Arc::new(ChatService::new(
        conversations.clone(),
        completion,
        config.completion.model.clone(),
    ));
    let selection = SelectionFlow::new(
        session.clone(),
        conversations.clone(),
        chat.clone(),
        config.dialog.min_messages_to_keep,
    );

    tracing::info!(
        "[Bootstrap] Ready with {} conversations",
        conversations.snapshot().len()
    );

    Notechat {
        conversations,
        session,
        chat,
        selection,
    }
}

/// Guarantees at least one conversation and a valid active pointer.
///
/// An empty store gets a fresh chat. A missing or dangling active pointer is
/// moved to the newest ordinary chat; when only questions exist it is left
/// unset.
pub fn ensure_default_conversation(conversations: &ConversationStore) {
    let snapshot = conversations.snapshot();
    if snapshot.is_empty() {
        let id = conversations.create_conversation(ConversationType::Conversation);
        tracing::info!("[Bootstrap] Created initial conversation {}", id);
        return;
    }

    if snapshot.active().is_some() {
        return;
    }

    if let Some(newest) = snapshot.newest(Some(ConversationType::Conversation)) {
        tracing::info!("[Bootstrap] Restoring active conversation to {}", newest.id);
        if let Err(e) = conversations.set_active_conversation(Some(newest.id.as_str())) {
            tracing::warn!("[Bootstrap] Failed to restore active conversation: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use notechat_core::completion::{CompletionMessage, CompletionRequest};
    use notechat_core::conversation::{
        Conversation, ConversationRepository, ConversationState, MessageRole,
    };
    use notechat_core::error::Result;
    use notechat_core::session::Tab;
    use notechat_core::storage::SESSION_MARKDOWN_KEY;
    use notechat_infrastructure::MemoryKeyValueStore;

    struct SilentCompletionClient;

    #[async_trait]
    impl CompletionClient for SilentCompletionClient {
        fn name(&self) -> &str {
            "silent"
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionMessage> {
            Ok(CompletionMessage::new(MessageRole::Assistant, "ok"))
        }
    }

    async fn start(storage: Arc<dyn KeyValueStore>) -> Notechat {
        bootstrap(
            storage,
            Arc::new(SilentCompletionClient),
            &NotechatConfig::default(),
        )
        .await
    }

    async fn seed(storage: &Arc<dyn KeyValueStore>, state: ConversationState) {
        KvConversationRepository::new(storage.clone())
            .save(&state)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_first_start_creates_chat_and_loads_sample() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let app = start(storage.clone()).await;

        let conversations = app.conversations.list_conversations(None);
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].title, "New Chat");
        assert_eq!(
            app.conversations.active_conversation_id(),
            Some(conversations[0].id.clone())
        );

        let markdown = app.session.markdown().unwrap();
        assert!(markdown.starts_with("# Session: Developer Copilot"));
        assert_eq!(app.session.active_tab(), Tab::Markdown);

        app.flush().await;
        assert_eq!(
            storage.get(SESSION_MARKDOWN_KEY).await.unwrap().as_deref(),
            Some(markdown.as_str())
        );
    }

    #[tokio::test]
    async fn test_restart_restores_conversations_and_document() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let first = start(storage.clone()).await;
        first.chat.send(None, "Hello").await.unwrap();
        first.session.set_markdown("# Mine");
        first.flush().await;
        let before = first.conversations.snapshot();

        let second = start(storage).await;
        assert_eq!(*second.conversations.snapshot(), *before);
        assert_eq!(second.session.markdown().as_deref(), Some("# Mine"));
    }

    #[tokio::test]
    async fn test_dangling_active_pointer_moves_to_newest_chat() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let mut state = ConversationState::new();
        for conversation in [
            Conversation::new("old", ConversationType::Conversation, 1),
            Conversation::new("new", ConversationType::Conversation, 2),
            Conversation::question("q", "text", 3),
        ] {
            state.conversations.insert(conversation.id.clone(), conversation);
        }
        state.active_conversation_id = Some("deleted".to_string());
        seed(&storage, state).await;

        let app = start(storage).await;
        assert_eq!(app.conversations.active_conversation_id().as_deref(), Some("new"));
        assert_eq!(app.conversations.list_conversations(None).len(), 3);
    }

    #[tokio::test]
    async fn test_only_questions_leaves_pointer_unset() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let mut state = ConversationState::new();
        let question = Conversation::question("q", "text", 3);
        state.conversations.insert(question.id.clone(), question);
        seed(&storage, state).await;

        let app = start(storage).await;
        assert_eq!(app.conversations.active_conversation_id(), None);
        assert_eq!(app.conversations.list_conversations(None).len(), 1);
    }
}
