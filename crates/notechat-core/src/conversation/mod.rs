//! Conversation domain module.
//!
//! This module contains all conversation-related domain models, the pure
//! reducer over conversation snapshots, the repository interface, and the
//! store that ties them together.
//!
//! # Module Structure
//!
//! - `message`: Message types (`MessageRole`, `Message`, `NewMessage`)
//! - `model`: Conversation entity and title rules (`Conversation`, `ConversationKind`)
//! - `state`: Immutable snapshots and typed actions (`ConversationState`, `ConversationAction`)
//! - `repository`: Repository trait for snapshot persistence
//! - `store`: The process-wide conversation store (`ConversationStore`)
//!
//! # Usage
//!
//! ```ignore
//! use notechat_core::conversation::{ConversationStore, ConversationType, NewMessage};
//!
//! let store = ConversationStore::in_memory();
//! let id = store.create_conversation(ConversationType::Conversation);
//! store.add_message(Some(id.as_str()), NewMessage::user("Hello"))?;
//! ```

mod message;
mod model;
mod repository;
mod state;
mod store;

// Re-export public API
pub use message::{Message, MessageRole, NewMessage};
pub use model::{
    Conversation, ConversationKind, ConversationType, DEFAULT_CHAT_TITLE, DEFAULT_QUESTION_TITLE,
    DERIVED_TITLE_CHARS, QUESTION_PREVIEW_CHARS, QUESTION_TITLE_PREFIX, derive_title,
    question_title, truncate_chars,
};
pub use repository::ConversationRepository;
pub use state::{ConversationAction, ConversationState};
pub use store::ConversationStore;
