//! Conversation domain model.
//!
//! This module contains the core Conversation entity and the title rules
//! applied when conversations are created and first written to.

use super::message::Message;
use serde::{Deserialize, Serialize};

/// Title given to a fresh ordinary conversation.
///
/// While a conversation still carries this title, its first non-blank user
/// message replaces it.
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Title given to a question created without selected text.
pub const DEFAULT_QUESTION_TITLE: &str = "New Question";

/// Prefix of titles derived from a text selection.
pub const QUESTION_TITLE_PREFIX: &str = "Question: ";

/// Number of characters of the selection kept in a question title.
pub const QUESTION_PREVIEW_CHARS: usize = 50;

/// Number of characters of the first user message kept as a derived title.
pub const DERIVED_TITLE_CHARS: usize = 30;

/// What a conversation was created for.
///
/// The selected text lives inside the `Question` variant, so a context is
/// present exactly when the conversation is a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConversationKind {
    /// Ordinary chat.
    Conversation,
    /// Spawned from a markdown text selection.
    Question {
        /// The full selected text.
        context: String,
    },
}

impl ConversationKind {
    /// Returns the payload-free type tag of this kind.
    pub fn conversation_type(&self) -> ConversationType {
        match self {
            ConversationKind::Conversation => ConversationType::Conversation,
            ConversationKind::Question { .. } => ConversationType::Question,
        }
    }
}

/// Payload-free conversation type, used for creation and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationType {
    #[default]
    Conversation,
    Question,
}

impl ConversationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationType::Conversation => "conversation",
            ConversationType::Question => "question",
        }
    }
}

/// A titled, ordered sequence of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier (UUID format)
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Messages in insertion order
    pub messages: Vec<Message>,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: i64,
    /// Conversation kind, carrying the selection context for questions
    #[serde(flatten)]
    pub kind: ConversationKind,
}

impl Conversation {
    /// Creates an empty conversation of the given type with its default title.
    ///
    /// A question created this way carries an empty context.
    pub fn new(id: impl Into<String>, conversation_type: ConversationType, created_at: i64) -> Self {
        let (title, kind) = match conversation_type {
            ConversationType::Conversation => {
                (DEFAULT_CHAT_TITLE, ConversationKind::Conversation)
            }
            ConversationType::Question => (
                DEFAULT_QUESTION_TITLE,
                ConversationKind::Question {
                    context: String::new(),
                },
            ),
        };

        Self {
            id: id.into(),
            title: title.to_string(),
            messages: Vec::new(),
            created_at,
            kind,
        }
    }

    /// Creates an empty question conversation seeded with the selected text.
    pub fn question(id: impl Into<String>, selected_text: impl Into<String>, created_at: i64) -> Self {
        let context = selected_text.into();
        Self {
            id: id.into(),
            title: question_title(&context),
            messages: Vec::new(),
            created_at,
            kind: ConversationKind::Question { context },
        }
    }

    pub fn conversation_type(&self) -> ConversationType {
        self.kind.conversation_type()
    }

    /// Returns the selection context of a question conversation.
    pub fn context(&self) -> Option<&str> {
        match &self.kind {
            ConversationKind::Question { context } => Some(context),
            ConversationKind::Conversation => None,
        }
    }

    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_CHAT_TITLE
    }
}

/// Builds the title of a question conversation from its selection.
pub fn question_title(selected_text: &str) -> String {
    let preview = truncate_chars(selected_text, QUESTION_PREVIEW_CHARS);
    if preview.len() < selected_text.len() {
        format!("{QUESTION_TITLE_PREFIX}{preview}...")
    } else {
        format!("{QUESTION_TITLE_PREFIX}{preview}")
    }
}

/// Derives a conversation title from message content.
///
/// Returns `None` for blank content.
pub fn derive_title(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(truncate_chars(trimmed, DERIVED_TITLE_CHARS).to_string())
}

/// Returns the prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_defaults() {
        let conversation = Conversation::new("c1", ConversationType::Conversation, 10);
        assert_eq!(conversation.title, DEFAULT_CHAT_TITLE);
        assert!(conversation.messages.is_empty());
        assert_eq!(conversation.context(), None);
        assert!(conversation.has_default_title());
    }

    #[test]
    fn test_short_question_title_has_no_ellipsis() {
        assert_eq!(question_title("fn main()"), "Question: fn main()");
    }

    #[test]
    fn test_exactly_fifty_chars_is_not_truncated() {
        let text = "a".repeat(50);
        assert_eq!(question_title(&text), format!("Question: {text}"));
    }

    #[test]
    fn test_long_question_title_is_truncated() {
        let text = "b".repeat(51);
        assert_eq!(question_title(&text), format!("Question: {}...", "b".repeat(50)));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "é".repeat(40);
        assert_eq!(truncate_chars(&text, 30).chars().count(), 30);
    }

    #[test]
    fn test_derive_title_trims_and_truncates() {
        assert_eq!(derive_title("   "), None);
        assert_eq!(derive_title("  Hello  ").as_deref(), Some("Hello"));
        assert_eq!(
            derive_title("How do I read a file line by line in Rust?").as_deref(),
            Some("How do I read a file line by l")
        );
    }

    #[test]
    fn test_kind_serializes_flat() {
        let conversation = Conversation::question("q1", "selected", 5);
        let value = serde_json::to_value(&conversation).unwrap();
        assert_eq!(value["type"], "question");
        assert_eq!(value["context"], "selected");

        let back: Conversation = serde_json::from_value(value).unwrap();
        assert_eq!(back, conversation);
    }
}
