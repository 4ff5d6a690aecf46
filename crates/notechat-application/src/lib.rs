//! Application layer for notechat.
//!
//! Use cases composed from the core stores, the infrastructure storage and
//! a completion client.

pub mod bootstrap;
pub mod chat_service;
pub mod selection;

pub use bootstrap::{Notechat, bootstrap, ensure_default_conversation};
pub use chat_service::{ChatReply, ChatService, draft_from_highlight};
pub use selection::{DialogOutcome, QuestionDialog, SelectionFlow, select_range};
