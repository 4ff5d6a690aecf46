//! Conversation repository backed by a [`KeyValueStore`].
//!
//! The whole snapshot lives under the `conversation-storage` key as
//! versioned JSON, migrated on load through [`create_conversation_state_migrator`].

use crate::dto::{CONVERSATION_STATE_ENTITY, create_conversation_state_migrator};
use async_trait::async_trait;
use notechat_core::conversation::{ConversationRepository, ConversationState};
use notechat_core::error::{NotechatError, Result};
use notechat_core::storage::{CONVERSATION_STORAGE_KEY, KeyValueStore};
use std::sync::Arc;

pub struct KvConversationRepository {
    storage: Arc<dyn KeyValueStore>,
}

impl KvConversationRepository {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ConversationRepository for KvConversationRepository {
    async fn load(&self) -> Result<Option<ConversationState>> {
        let Some(raw) = self.storage.get(CONVERSATION_STORAGE_KEY).await? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }

        let json_value: serde_json::Value = serde_json::from_str(&raw)?;

        let migrator = create_conversation_state_migrator()?;
        let state: ConversationState = migrator
            .load_flat_from(CONVERSATION_STATE_ENTITY, json_value)
            .map_err(|e| {
                NotechatError::Migration(format!("Failed to migrate conversations: {}", e))
            })?;

        tracing::debug!(
            "[KvConversationRepository] Loaded {} conversations",
            state.len()
        );
        Ok(Some(state))
    }

    async fn save(&self, state: &ConversationState) -> Result<()> {
        let migrator = create_conversation_state_migrator()?;
        let json_str = migrator.save_domain_flat(CONVERSATION_STATE_ENTITY, state)?;

        self.storage.set(CONVERSATION_STORAGE_KEY, &json_str).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileKeyValueStore, MemoryKeyValueStore};
    use notechat_core::conversation::{
        ConversationStore, ConversationType, NewMessage,
    };
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_empty_storage() {
        let repository = KvConversationRepository::new(Arc::new(MemoryKeyValueStore::new()));
        assert_eq!(repository.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_garbage_is_an_error() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        storage.set(CONVERSATION_STORAGE_KEY, "{not json").await.unwrap();

        let repository = KvConversationRepository::new(storage);
        assert!(repository.load().await.is_err());
    }

    #[tokio::test]
    async fn test_store_round_trip_through_key_value_store() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let repository: Arc<dyn ConversationRepository> =
            Arc::new(KvConversationRepository::new(storage.clone()));

        let store = ConversationStore::new(repository.clone());
        let chat_id = store.create_conversation(ConversationType::Conversation);
        store.add_message(None, NewMessage::user("Hello")).unwrap();
        store.add_message(None, NewMessage::assistant("Hi there")).unwrap();
        let question_id = store.create_question_conversation("fn main() {}");
        store
            .add_message(Some(question_id.as_str()), NewMessage::user("What is this?"))
            .unwrap();
        store.flush().await;

        let before = store.snapshot();
        let reloaded = ConversationStore::rehydrate(repository).await;
        let after = reloaded.snapshot();

        assert_eq!(*after, *before);
        assert_eq!(reloaded.active_conversation_id().as_deref(), Some(chat_id.as_str()));
        let question = reloaded.get_conversation(&question_id).unwrap();
        assert_eq!(question.context(), Some("fn main() {}"));
        assert_eq!(question.messages[0].content, "What is this?");
    }

    #[tokio::test]
    async fn test_legacy_snapshot_without_type_loads() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        storage
            .set(
                CONVERSATION_STORAGE_KEY,
                r#"{"version":"1.0.0","conversations":{"c1":{"id":"c1","title":"New Chat","messages":[],"created_at":1}},"active_conversation_id":"c1"}"#,
            )
            .await
            .unwrap();

        let repository = KvConversationRepository::new(storage);
        let state = repository.load().await.unwrap().unwrap();
        assert_eq!(
            state.get("c1").unwrap().conversation_type(),
            ConversationType::Conversation
        );
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(temp.path()));
        let repository = KvConversationRepository::new(storage);

        let mut state = ConversationState::new();
        let conversation = notechat_core::conversation::Conversation::new(
            "c1",
            ConversationType::Conversation,
            10,
        );
        state.conversations.insert("c1".to_string(), conversation);
        state.active_conversation_id = Some("c1".to_string());

        repository.save(&state).await.unwrap();
        assert_eq!(repository.load().await.unwrap(), Some(state));
    }
}
