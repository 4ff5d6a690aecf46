use super::message::{Message, NewMessage};
use super::model::{Conversation, ConversationType};
use super::repository::ConversationRepository;
use super::state::{ConversationAction, ConversationState};
use crate::error::Result;
use crate::storage::BackgroundWriter;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Single source of truth for conversations and the active pointer.
///
/// `ConversationStore` is responsible for:
/// - Generating conversation and message identifiers
/// - Dispatching typed actions against the current snapshot
/// - Swapping in the resulting snapshot
/// - Handing every new snapshot to the background writer
///
/// Operations are synchronous; persistence is fire-and-forget.
pub struct ConversationStore {
    /// Current immutable snapshot
    state: RwLock<Arc<ConversationState>>,
    /// Background persistence, absent for in-memory stores
    writer: Option<BackgroundWriter<Arc<ConversationState>>>,
}

impl ConversationStore {
    /// Creates an empty store that never persists.
    pub fn in_memory() -> Self {
        Self::from_state(ConversationState::default(), None)
    }

    /// Creates an empty store persisting to `repository`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(repository: Arc<dyn ConversationRepository>) -> Self {
        Self::with_state(ConversationState::default(), repository)
    }

    /// Creates a store from an existing snapshot, persisting to `repository`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_state(state: ConversationState, repository: Arc<dyn ConversationRepository>) -> Self {
        let writer = BackgroundWriter::spawn("conversations", move |snapshot: Arc<ConversationState>| {
            let repository = repository.clone();
            async move { repository.save(&snapshot).await }
        });
        Self::from_state(state, Some(writer))
    }

    /// Rehydrates the store from `repository`.
    ///
    /// A failed or empty read yields an empty store; the failure is logged.
    pub async fn rehydrate(repository: Arc<dyn ConversationRepository>) -> Self {
        let state = match repository.load().await {
            Ok(Some(state)) => {
                tracing::info!(
                    "[ConversationStore] Rehydrated {} conversations",
                    state.len()
                );
                state
            }
            Ok(None) => {
                tracing::info!("[ConversationStore] No persisted conversations");
                ConversationState::default()
            }
            Err(e) => {
                tracing::warn!(
                    "[ConversationStore] Failed to load conversations, starting empty: {}",
                    e
                );
                ConversationState::default()
            }
        };
        Self::with_state(state, repository)
    }

    fn from_state(
        state: ConversationState,
        writer: Option<BackgroundWriter<Arc<ConversationState>>>,
    ) -> Self {
        Self {
            state: RwLock::new(Arc::new(state)),
            writer,
        }
    }

    /// Returns the current immutable snapshot.
    pub fn snapshot(&self) -> Arc<ConversationState> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Applies an action, swaps in the new snapshot and queues it for persistence.
    ///
    /// # Errors
    ///
    /// Returns the reducer's error unchanged; the current snapshot is kept.
    pub fn dispatch(&self, action: ConversationAction) -> Result<Arc<ConversationState>> {
        let mut current = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let next = match current.apply(action) {
            Ok(next) => Arc::new(next),
            Err(e) => {
                tracing::warn!("[ConversationStore] Action rejected: {}", e);
                return Err(e);
            }
        };
        *current = next.clone();

        // Queue while still holding the lock so writes follow swap order.
        if let Some(writer) = &self.writer {
            writer.submit(next.clone());
        }
        drop(current);
        Ok(next)
    }

    /// Creates an empty conversation, makes it active and returns its id.
    pub fn create_conversation(&self, conversation_type: ConversationType) -> String {
        let id = Uuid::new_v4().to_string();
        tracing::debug!(
            "[ConversationStore] create_conversation: id={}, type={}",
            id,
            conversation_type.as_str()
        );
        self.dispatch_infallible(ConversationAction::Create {
            id: id.clone(),
            conversation_type,
            created_at: now_millis(),
        });
        id
    }

    /// Creates a question seeded with `selected_text` and returns its id.
    ///
    /// The active conversation is left untouched.
    pub fn create_question_conversation(&self, selected_text: impl Into<String>) -> String {
        let id = Uuid::new_v4().to_string();
        tracing::debug!("[ConversationStore] create_question_conversation: id={}", id);
        self.dispatch_infallible(ConversationAction::CreateQuestion {
            id: id.clone(),
            selected_text: selected_text.into(),
            created_at: now_millis(),
        });
        id
    }

    /// Points the chat view at `id`, or at nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when `id` is not a stored conversation.
    pub fn set_active_conversation(&self, id: Option<&str>) -> Result<()> {
        self.dispatch(ConversationAction::SetActive {
            id: id.map(str::to_string),
        })
        .map(|_| ())
    }

    /// Appends a message to `conversation_id`, or to the active conversation.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the target does not resolve; nothing is changed.
    pub fn add_message(&self, conversation_id: Option<&str>, message: NewMessage) -> Result<Message> {
        let message = message.with_id(Uuid::new_v4().to_string());
        self.dispatch(ConversationAction::AddMessage {
            conversation_id: conversation_id.map(str::to_string),
            message: message.clone(),
        })?;
        Ok(message)
    }

    pub fn get_conversation(&self, id: &str) -> Option<Conversation> {
        self.snapshot().get(id).cloned()
    }

    /// Lists conversations newest first, optionally restricted to one type.
    pub fn list_conversations(&self, filter: Option<ConversationType>) -> Vec<Conversation> {
        self.snapshot().list(filter).into_iter().cloned().collect()
    }

    /// Deletes a conversation; if it was active, the newest remaining one
    /// becomes active.
    pub fn delete_conversation(&self, id: &str) -> Result<()> {
        self.dispatch(ConversationAction::Delete { id: id.to_string() })
            .map(|_| ())
    }

    pub fn update_title(&self, id: &str, title: impl Into<String>) -> Result<()> {
        self.dispatch(ConversationAction::UpdateTitle {
            id: id.to_string(),
            title: title.into(),
        })
        .map(|_| ())
    }

    pub fn active_conversation_id(&self) -> Option<String> {
        self.snapshot().active_conversation_id.clone()
    }

    pub fn active_conversation(&self) -> Option<Conversation> {
        self.snapshot().active().cloned()
    }

    /// Waits until every snapshot produced so far has been written.
    pub async fn flush(&self) {
        if let Some(writer) = &self.writer {
            writer.flush().await;
        }
    }

    fn dispatch_infallible(&self, action: ConversationAction) {
        // Create actions never address an existing conversation.
        if let Err(e) = self.dispatch(action) {
            tracing::error!("[ConversationStore] Create action failed: {}", e);
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
