//! Selection-to-question flow.
//!
//! The viewer buffers the user's selection; from there it can either be
//! handed to the main chat ("discuss") or materialised as a dedicated
//! question conversation answered in a [`QuestionDialog`].

use crate::chat_service::{ChatReply, ChatService};
use notechat_core::conversation::ConversationStore;
use notechat_core::error::{NotechatError, Result};
use notechat_core::session::{SessionStore, Tab};
use std::sync::{Arc, Mutex, PoisonError};

/// Returns the text between two character offsets of `markdown`.
///
/// Offsets are clamped to the document and may be given in either order.
/// An empty range yields `None`.
pub fn select_range(markdown: &str, start: usize, end: usize) -> Option<String> {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let selected: String = markdown.chars().skip(start).take(end - start).collect();
    if selected.is_empty() {
        None
    } else {
        Some(selected)
    }
}

/// What [`QuestionDialog::close`] did with the question conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOutcome {
    /// Enough messages were exchanged; the conversation stays listed.
    Kept,
    /// The conversation was deleted.
    Discarded,
}

pub struct SelectionFlow {
    session: Arc<SessionStore>,
    conversations: Arc<ConversationStore>,
    chat: Arc<ChatService>,
    min_messages_to_keep: usize,
    selection: Mutex<Option<String>>,
}

impl SelectionFlow {
    pub fn new(
        session: Arc<SessionStore>,
        conversations: Arc<ConversationStore>,
        chat: Arc<ChatService>,
        min_messages_to_keep: usize,
    ) -> Self {
        Self {
            session,
            conversations,
            chat,
            min_messages_to_keep,
            selection: Mutex::new(None),
        }
    }

    /// Replaces the buffered selection. Empty text clears it.
    pub fn buffer_selection(&self, text: impl Into<String>) {
        let text = text.into();
        *self.selection.lock().unwrap_or_else(PoisonError::into_inner) =
            if text.is_empty() { None } else { Some(text) };
    }

    pub fn clear_selection(&self) {
        *self.selection.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn selected_text(&self) -> Option<String> {
        self.selection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Hands the selection to the main chat and switches to the chat tab.
    ///
    /// Returns `false` when nothing is selected.
    pub fn discuss_in_chat(&self) -> bool {
        let Some(text) = self.selected_text() else {
            return false;
        };
        self.session.set_highlight_context(text);
        self.session.set_active_tab(Tab::Chatbot);
        true
    }

    /// Opens a question conversation seeded with the buffered selection.
    ///
    /// The active conversation is left unchanged.
    pub fn ask_about_selection(&self) -> Result<QuestionDialog> {
        let text = self.selected_text().ok_or(NotechatError::EmptySelection)?;

        let conversation_id = self.conversations.create_question_conversation(text);
        self.clear_selection();
        tracing::debug!("[SelectionFlow] Opened question {}", conversation_id);

        Ok(QuestionDialog {
            conversation_id,
            conversations: self.conversations.clone(),
            chat: self.chat.clone(),
            min_messages_to_keep: self.min_messages_to_keep,
        })
    }
}

/// A dialog bound to one question conversation.
pub struct QuestionDialog {
    conversation_id: String,
    conversations: Arc<ConversationStore>,
    chat: Arc<ChatService>,
    min_messages_to_keep: usize,
}

impl QuestionDialog {
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Asks `text` in this dialog's conversation.
    pub async fn ask(&self, text: &str) -> Result<ChatReply> {
        self.chat.send(Some(self.conversation_id.as_str()), text).await
    }

    /// Closes the dialog, discarding the conversation when too few messages
    /// were exchanged.
    pub fn close(self) -> Result<DialogOutcome> {
        let exchanged = self
            .conversations
            .get_conversation(&self.conversation_id)
            .map(|conversation| conversation.messages.len());

        match exchanged {
            Some(count) if count >= self.min_messages_to_keep => Ok(DialogOutcome::Kept),
            Some(_) => {
                self.conversations.delete_conversation(&self.conversation_id)?;
                tracing::debug!(
                    "[QuestionDialog] Discarded unused question {}",
                    self.conversation_id
                );
                Ok(DialogOutcome::Discarded)
            }
            None => {
                tracing::warn!(
                    "[QuestionDialog] Question {} was already deleted",
                    self.conversation_id
                );
                Ok(DialogOutcome::Discarded)
            }
        }
    }
}
