//! Chat use case: append a user message, ask the completion backend, record the reply.

use notechat_core::completion::{CompletionClient, CompletionMessage, CompletionRequest};
use notechat_core::conversation::{
    Conversation, ConversationKind, ConversationStore, Message, MessageRole, NewMessage,
};
use notechat_core::error::{NotechatError, Result};
use std::sync::Arc;

/// Prefix of the prompt pre-filled from a pending highlight.
pub const HIGHLIGHT_DRAFT_PREFIX: &str = "Help me understand this code:\n\n";

/// Message recorded in the conversation when the completion request fails.
pub const COMPLETION_FAILURE_MESSAGE: &str =
    "Sorry, there was an error processing your request. Please try again.";

/// Returns the prompt pre-filled when the chat opens with highlighted text.
pub fn draft_from_highlight(text: &str) -> String {
    format!("{HIGHLIGHT_DRAFT_PREFIX}{text}")
}

/// Outcome of [`ChatService::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    /// The assistant reply, as appended to the conversation.
    Answered(Message),
    /// The completion failed; carries the appended system notice.
    Failed(Message),
}

impl ChatReply {
    pub fn message(&self) -> &Message {
        match self {
            ChatReply::Answered(message) | ChatReply::Failed(message) => message,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, ChatReply::Answered(_))
    }
}

pub struct ChatService {
    conversations: Arc<ConversationStore>,
    completion: Arc<dyn CompletionClient>,
    model: String,
}

impl ChatService {
    pub fn new(
        conversations: Arc<ConversationStore>,
        completion: Arc<dyn CompletionClient>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            conversations,
            completion,
            model: model.into(),
        }
    }

    /// Sends `text` to `conversation_id`, or to the active conversation when `None`.
    ///
    /// The target is resolved once, before the completion call, so the reply
    /// lands in the same conversation even if the active one changes meanwhile.
    ///
    /// # Errors
    ///
    /// - `EmptyMessage` when `text` is blank
    /// - `NotFound` when the target conversation does not exist
    ///
    /// A failed completion is not an error: it is recorded as a system
    /// message and reported as [`ChatReply::Failed`].
    pub async fn send(&self, conversation_id: Option<&str>, text: &str) -> Result<ChatReply> {
        let content = text.trim();
        if content.is_empty() {
            return Err(NotechatError::EmptyMessage);
        }

        let target = match conversation_id {
            Some(id) => id.to_string(),
            None => self
                .conversations
                .active_conversation_id()
                .ok_or_else(|| NotechatError::not_found("Conversation", "<active>"))?,
        };

        self.conversations
            .add_message(Some(target.as_str()), NewMessage::user(content))?;

        let conversation = self
            .conversations
            .get_conversation(&target)
            .ok_or_else(|| NotechatError::not_found("Conversation", target.as_str()))?;
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: completion_messages(&conversation),
        };

        match self.completion.complete(request).await {
            Ok(reply) => {
                let message = self
                    .conversations
                    .add_message(Some(target.as_str()), NewMessage::assistant(reply.content))?;
                Ok(ChatReply::Answered(message))
            }
            Err(e) => {
                tracing::error!(
                    "[ChatService] {} completion failed for {}: {}",
                    self.completion.name(),
                    target,
                    e
                );
                let message = self
                    .conversations
                    .add_message(Some(target.as_str()), NewMessage::system(COMPLETION_FAILURE_MESSAGE))?;
                Ok(ChatReply::Failed(message))
            }
        }
    }
}

/// Builds the completion history for `conversation`, in order.
///
/// Question conversations start with a system message carrying the selection.
fn completion_messages(conversation: &Conversation) -> Vec<CompletionMessage> {
    let mut messages = Vec::with_capacity(conversation.messages.len() + 1);
    if let ConversationKind::Question { context } = &conversation.kind {
        messages.push(CompletionMessage::new(
            MessageRole::System,
            format!("The user selected the following text and has a question about it:\n\n{context}"),
        ));
    }
    messages.extend(
        conversation
            .messages
            .iter()
            .map(|message| CompletionMessage::new(message.role, message.content.clone())),
    );
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use notechat_core::conversation::ConversationType;
    use std::sync::Mutex;

    // Mock CompletionClient for testing
    #[derive(Default)]
    struct MockCompletionClient {
        requests: Mutex<Vec<CompletionRequest>>,
        fail: bool,
    }

    impl MockCompletionClient {
        fn failing() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl CompletionClient for MockCompletionClient {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<CompletionMessage> {
            let count = request.messages.len();
            self.requests.lock().unwrap().push(request);
            if self.fail {
                return Err(NotechatError::completion("boom"));
            }
            Ok(CompletionMessage::new(
                MessageRole::Assistant,
                format!("reply to {count} messages"),
            ))
        }
    }

    fn service(client: Arc<MockCompletionClient>) -> (Arc<ConversationStore>, ChatService) {
        let store = Arc::new(ConversationStore::in_memory());
        let chat = ChatService::new(store.clone(), client, "test-model");
        (store, chat)
    }

    #[test]
    fn test_draft_from_highlight() {
        assert_eq!(
            draft_from_highlight("let x = 1;"),
            "Help me understand this code:\n\nlet x = 1;"
        );
    }

    #[tokio::test]
    async fn test_send_appends_user_and_assistant() {
        let client = Arc::new(MockCompletionClient::default());
        let (store, chat) = service(client.clone());
        let id = store.create_conversation(ConversationType::Conversation);

        let reply = chat.send(None, "  Hello  ").await.unwrap();
        assert!(reply.is_answered());
        assert_eq!(reply.message().content, "reply to 1 messages");

        let conversation = store.get_conversation(&id).unwrap();
        assert_eq!(conversation.title, "Hello");
        let roles: Vec<MessageRole> = conversation.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant]);
        assert_eq!(conversation.messages[0].content, "Hello");

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].model, "test-model");
    }

    #[tokio::test]
    async fn test_history_is_sent_in_order() {
        let client = Arc::new(MockCompletionClient::default());
        let (store, chat) = service(client.clone());
        store.create_conversation(ConversationType::Conversation);

        chat.send(None, "first").await.unwrap();
        chat.send(None, "second").await.unwrap();

        let requests = client.requests.lock().unwrap();
        let contents: Vec<&str> = requests[1]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "reply to 1 messages", "second"]);
    }

    #[tokio::test]
    async fn test_question_context_is_prefixed() {
        let client = Arc::new(MockCompletionClient::default());
        let (store, chat) = service(client.clone());
        let id = store.create_question_conversation("fn main() {}");

        chat.send(Some(id.as_str()), "What does this do?").await.unwrap();

        let requests = client.requests.lock().unwrap();
        let messages = &requests[0].messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert!(messages[0].content.ends_with("fn main() {}"));
        assert_eq!(messages[1].content, "What does this do?");
    }

    #[tokio::test]
    async fn test_failure_is_recorded_as_system_message() {
        let client = Arc::new(MockCompletionClient::failing());
        let (store, chat) = service(client);
        let id = store.create_conversation(ConversationType::Conversation);

        let reply = chat.send(None, "Hello").await.unwrap();
        assert!(!reply.is_answered());

        let conversation = store.get_conversation(&id).unwrap();
        let last = conversation.messages.last().unwrap();
        assert_eq!(last.role, MessageRole::System);
        assert_eq!(last.content, COMPLETION_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected() {
        let client = Arc::new(MockCompletionClient::default());
        let (store, chat) = service(client.clone());
        let id = store.create_conversation(ConversationType::Conversation);

        let err = chat.send(None, "   \n").await.unwrap_err();
        assert!(matches!(err, NotechatError::EmptyMessage));
        assert!(store.get_conversation(&id).unwrap().messages.is_empty());
        assert!(client.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_target_is_not_found() {
        let client = Arc::new(MockCompletionClient::default());
        let (store, chat) = service(client.clone());

        let err = chat.send(None, "Hello").await.unwrap_err();
        assert!(err.is_not_found());

        let err = chat.send(Some("does-not-exist"), "Hello").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.snapshot().is_empty());
        assert!(client.requests.lock().unwrap().is_empty());
    }
}
