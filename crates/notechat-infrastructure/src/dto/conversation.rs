//! Conversation snapshot DTOs and migrations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use version_migrate::{FromDomain, IntoDomain, MigratesTo, Versioned};

use notechat_core::conversation::{
    Conversation, ConversationKind, ConversationState, Message,
};
use notechat_core::error::Result;

/// Storage entity name of the conversation snapshot.
pub const CONVERSATION_STATE_ENTITY: &str = "conversation_state";

// ============================================================================
// ConversationType DTO (Anti-Corruption Layer)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationTypeDTO {
    Conversation,
    Question,
}

// ============================================================================
// Conversation record DTOs
// ============================================================================

/// V1.0.0 conversation record.
/// Records written before questions existed carry no `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecordV1_0_0 {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: i64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub conversation_type: Option<ConversationTypeDTO>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// V1.1.0 conversation record.
/// `type` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecordV1_1_0 {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: i64,
    #[serde(rename = "type")]
    pub conversation_type: ConversationTypeDTO,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl From<ConversationRecordV1_0_0> for ConversationRecordV1_1_0 {
    fn from(record: ConversationRecordV1_0_0) -> Self {
        Self {
            id: record.id,
            title: record.title,
            messages: record.messages,
            created_at: record.created_at,
            conversation_type: record
                .conversation_type
                .unwrap_or(ConversationTypeDTO::Conversation),
            context: record.context,
        }
    }
}

impl From<ConversationRecordV1_1_0> for Conversation {
    fn from(record: ConversationRecordV1_1_0) -> Self {
        let kind = match record.conversation_type {
            ConversationTypeDTO::Conversation => ConversationKind::Conversation,
            ConversationTypeDTO::Question => ConversationKind::Question {
                context: record.context.unwrap_or_default(),
            },
        };

        Conversation {
            id: record.id,
            title: record.title,
            messages: record.messages,
            created_at: record.created_at,
            kind,
        }
    }
}

impl From<Conversation> for ConversationRecordV1_1_0 {
    fn from(conversation: Conversation) -> Self {
        let (conversation_type, context) = match conversation.kind {
            ConversationKind::Conversation => (ConversationTypeDTO::Conversation, None),
            ConversationKind::Question { context } => (ConversationTypeDTO::Question, Some(context)),
        };

        ConversationRecordV1_1_0 {
            id: conversation.id,
            title: conversation.title,
            messages: conversation.messages,
            created_at: conversation.created_at,
            conversation_type,
            context,
        }
    }
}

// ============================================================================
// ConversationState DTOs
// ============================================================================

/// Represents V1.0.0 of the conversation snapshot schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct ConversationStateV1_0_0 {
    #[serde(default)]
    pub conversations: HashMap<String, ConversationRecordV1_0_0>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_conversation_id: Option<String>,
}

/// Represents V1.1.0 of the conversation snapshot schema.
/// Every record carries its `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
pub struct ConversationStateV1_1_0 {
    #[serde(default)]
    pub conversations: HashMap<String, ConversationRecordV1_1_0>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_conversation_id: Option<String>,
}

/// Migration from V1.0.0 to V1.1.0: untyped records become ordinary chats.
impl MigratesTo<ConversationStateV1_1_0> for ConversationStateV1_0_0 {
    fn migrate(self) -> ConversationStateV1_1_0 {
        ConversationStateV1_1_0 {
            conversations: self
                .conversations
                .into_iter()
                .map(|(id, record)| (id, record.into()))
                .collect(),
            active_conversation_id: self.active_conversation_id,
        }
    }
}

/// Convert ConversationStateV1_1_0 DTO to domain model.
///
/// A dangling active pointer is dropped so the restored snapshot satisfies
/// the store's invariants.
impl IntoDomain<ConversationState> for ConversationStateV1_1_0 {
    fn into_domain(self) -> ConversationState {
        let conversations: HashMap<String, Conversation> = self
            .conversations
            .into_values()
            .map(|record| {
                let conversation = Conversation::from(record);
                (conversation.id.clone(), conversation)
            })
            .collect();

        let active_conversation_id = self
            .active_conversation_id
            .filter(|id| conversations.contains_key(id));

        ConversationState {
            conversations,
            active_conversation_id,
        }
    }
}

/// Convert domain model to ConversationStateV1_1_0 DTO for persistence.
impl FromDomain<ConversationState> for ConversationStateV1_1_0 {
    fn from_domain(state: ConversationState) -> Self {
        ConversationStateV1_1_0 {
            conversations: state
                .conversations
                .into_iter()
                .map(|(id, conversation)| (id, conversation.into()))
                .collect(),
            active_conversation_id: state.active_conversation_id,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates and configures a Migrator instance for conversation snapshots.
///
/// # Migration Path
///
/// - V1.0.0 → V1.1.0: Defaults a missing `type` to `conversation`
/// - V1.1.0 → ConversationState: Converts DTO to domain model
///
/// # Example
///
/// ```ignore
/// let migrator = create_conversation_state_migrator()?;
/// let state: ConversationState = migrator.load_flat_from(CONVERSATION_STATE_ENTITY, json_value)?;
/// ```
pub fn create_conversation_state_migrator() -> Result<version_migrate::Migrator> {
    let mut migrator = version_migrate::Migrator::builder().build();

    // Register migration path: V1.0.0 -> V1.1.0 -> ConversationState
    let path = version_migrate::Migrator::define(CONVERSATION_STATE_ENTITY)
        .from::<ConversationStateV1_0_0>()
        .step::<ConversationStateV1_1_0>()
        .into_with_save::<ConversationState>();

    migrator.register(path)?;

    Ok(migrator)
}
