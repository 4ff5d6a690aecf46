//! REPL command parsing.

use notechat_core::conversation::ConversationType;

/// Slash commands offered for completion and hints.
pub const COMMANDS: &[&str] = &[
    "/new", "/list", "/switch", "/delete", "/title", "/open", "/doc", "/select", "/ask",
    "/close", "/discuss", "/tab", "/help", "/quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Starts a new chat.
    New,
    /// Lists conversations, optionally of one kind.
    List(Option<ConversationType>),
    Switch(String),
    Delete(String),
    /// Renames the active conversation.
    Title(String),
    /// Loads a markdown file, or reloads the last opened one.
    Open(Option<String>),
    /// Prints the current document.
    Doc,
    /// Buffers the characters between two offsets of the document.
    Select { start: usize, end: usize },
    Ask,
    /// Closes the open question dialog.
    Close,
    Discuss,
    Tab,
    Help,
    Quit,
    /// Plain text sent as a chat message.
    Message(String),
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if !line.starts_with('/') {
            return Ok(Some(Command::Message(line.to_string())));
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name {
            "/new" => Command::New,
            "/list" => Command::List(match rest {
                "" => None,
                "chat" | "chats" | "conversation" => Some(ConversationType::Conversation),
                "question" | "questions" => Some(ConversationType::Question),
                other => return Err(format!("Unknown conversation kind '{other}'")),
            }),
            "/switch" => Command::Switch(required(rest, "/switch <id>")?),
            "/delete" => Command::Delete(required(rest, "/delete <id>")?),
            "/title" => Command::Title(required(rest, "/title <text>")?),
            "/open" => Command::Open((!rest.is_empty()).then(|| rest.to_string())),
            "/doc" => Command::Doc,
            "/select" => {
                let mut offsets = rest.split_whitespace().map(str::parse::<usize>);
                match (offsets.next(), offsets.next(), offsets.next()) {
                    (Some(Ok(start)), Some(Ok(end)), None) => Command::Select { start, end },
                    _ => return Err("Usage: /select <start> <end>".to_string()),
                }
            }
            "/ask" => Command::Ask,
            "/close" => Command::Close,
            "/discuss" => Command::Discuss,
            "/tab" => Command::Tab,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other => return Err(format!("Unknown command '{other}'. Type /help")),
        };
        Ok(Some(command))
    }
}

fn required(rest: &str, usage: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("Usage: {usage}"))
    } else {
        Ok(rest.to_string())
    }
}
