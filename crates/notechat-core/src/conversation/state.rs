//! Immutable conversation snapshots and the actions that produce them.
//!
//! `ConversationState::apply` is a pure function: it never touches the
//! snapshot it is called on and either returns the next snapshot or an
//! error, in which case the caller keeps the old one.

use super::message::{Message, MessageRole, NewMessage};
use super::model::{Conversation, ConversationType, derive_title};
use crate::error::{NotechatError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A typed mutation of the conversation state.
///
/// Identifiers and timestamps are generated by the store before dispatch,
/// which keeps `apply` deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    /// Insert an empty conversation and make it active.
    Create {
        id: String,
        conversation_type: ConversationType,
        created_at: i64,
    },
    /// Insert a question seeded with a selection. The active pointer is kept.
    CreateQuestion {
        id: String,
        selected_text: String,
        created_at: i64,
    },
    /// Point the chat view at a conversation, or at nothing.
    SetActive { id: Option<String> },
    /// Append a message to the given conversation, or to the active one.
    AddMessage {
        conversation_id: Option<String>,
        message: Message,
    },
    /// Remove a conversation, repairing the active pointer.
    Delete { id: String },
    /// Overwrite a conversation title.
    UpdateTitle { id: String, title: String },
}

impl ConversationAction {
    /// Builds an `AddMessage` action from an unsaved message.
    pub fn add_message(
        conversation_id: Option<String>,
        message_id: impl Into<String>,
        message: NewMessage,
    ) -> Self {
        Self::AddMessage {
            conversation_id,
            message: message.with_id(message_id),
        }
    }
}

/// Every conversation plus the active pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Conversations keyed by identifier
    pub conversations: HashMap<String, Conversation>,
    /// The conversation shown in the chat view
    pub active_conversation_id: Option<String>,
}

impl ConversationState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an action and returns the resulting snapshot.
    ///
    /// # Errors
    ///
    /// Returns `NotechatError::NotFound` when the action addresses a
    /// conversation that does not exist (or, for `AddMessage` without an
    /// explicit id, when no conversation is active).
    pub fn apply(&self, action: ConversationAction) -> Result<ConversationState> {
        let mut next = self.clone();

        match action {
            ConversationAction::Create {
                id,
                conversation_type,
                created_at,
            } => {
                let conversation = Conversation::new(id.clone(), conversation_type, created_at);
                next.conversations.insert(id.clone(), conversation);
                next.active_conversation_id = Some(id);
            }
            ConversationAction::CreateQuestion {
                id,
                selected_text,
                created_at,
            } => {
                let conversation = Conversation::question(id.clone(), selected_text, created_at);
                next.conversations.insert(id, conversation);
            }
            ConversationAction::SetActive { id } => {
                if let Some(id) = &id {
                    if !next.conversations.contains_key(id) {
                        return Err(NotechatError::not_found("Conversation", id.clone()));
                    }
                }
                next.active_conversation_id = id;
            }
            ConversationAction::AddMessage {
                conversation_id,
                message,
            } => {
                let target = conversation_id
                    .or_else(|| next.active_conversation_id.clone())
                    .ok_or_else(|| NotechatError::not_found("Conversation", "<active>"))?;
                let conversation = next
                    .conversations
                    .get_mut(&target)
                    .ok_or_else(|| NotechatError::not_found("Conversation", target.clone()))?;

                if conversation.has_default_title() && message.role == MessageRole::User {
                    if let Some(title) = derive_title(&message.content) {
                        conversation.title = title;
                    }
                }
                conversation.messages.push(message);
            }
            ConversationAction::Delete { id } => {
                if next.conversations.remove(&id).is_none() {
                    return Err(NotechatError::not_found("Conversation", id));
                }
                if next.active_conversation_id.as_deref() == Some(id.as_str()) {
                    next.active_conversation_id = next.newest(None).map(|c| c.id.clone());
                }
            }
            ConversationAction::UpdateTitle { id, title } => {
                let conversation = next
                    .conversations
                    .get_mut(&id)
                    .ok_or_else(|| NotechatError::not_found("Conversation", id.clone()))?;
                conversation.title = title;
            }
        }

        Ok(next)
    }

    /// Returns a conversation by id.
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    /// Returns the active conversation, if the pointer resolves.
    pub fn active(&self) -> Option<&Conversation> {
        self.active_conversation_id
            .as_deref()
            .and_then(|id| self.conversations.get(id))
    }

    /// Lists conversations newest first, optionally restricted to one type.
    ///
    /// Conversations created in the same millisecond are ordered by id.
    pub fn list(&self, filter: Option<ConversationType>) -> Vec<&Conversation> {
        let mut conversations: Vec<&Conversation> = self
            .conversations
            .values()
            .filter(|c| filter.is_none_or(|t| c.conversation_type() == t))
            .collect();
        conversations.sort_by(|a, b| newest_first(a, b));
        conversations
    }

    /// Returns the most recently created conversation, optionally of one type.
    pub fn newest(&self, filter: Option<ConversationType>) -> Option<&Conversation> {
        self.conversations
            .values()
            .filter(|c| filter.is_none_or(|t| c.conversation_type() == t))
            .min_by(|a, b| newest_first(a, b))
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

fn newest_first(a: &Conversation, b: &Conversation) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}
