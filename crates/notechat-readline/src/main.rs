mod command;

use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use notechat_application::{
    ChatReply, DialogOutcome, Notechat, QuestionDialog, bootstrap, draft_from_highlight,
    select_range,
};
use notechat_core::completion::CompletionClient;
use notechat_core::conversation::{Conversation, ConversationType, Message, MessageRole};
use notechat_core::session::Tab;
use notechat_infrastructure::sample::load_sample_markdown;
use notechat_infrastructure::{ConfigService, FileKeyValueStore, NotechatPaths};
use notechat_interaction::{SimulatedCompletionClient, create_completion_client};

use command::{COMMANDS, Command};

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|cmd| cmd.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Installs file logging under the logs directory.
///
/// Logs go to a daily-rotated file only so they never interleave with the REPL.
fn init_logging(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    std::fs::create_dir_all(log_dir).ok();
    let file_appender = tracing_appender::rolling::daily(log_dir, "notechat.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(log_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    guard
}

fn log_filter() -> tracing_subscriber::EnvFilter {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "notechat=info".to_string());

    tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}

/// REPL state on top of the application services.
struct Repl {
    app: Notechat,
    /// Open question dialog; plain lines go here while it is set.
    dialog: Option<QuestionDialog>,
}

impl Repl {
    fn prompt(&self) -> String {
        if self.dialog.is_some() {
            return "question> ".to_string();
        }
        match self.app.session.active_tab() {
            Tab::Markdown => "doc> ".to_string(),
            Tab::Chatbot => "chat> ".to_string(),
        }
    }

    /// Runs one command. Returns `false` when the REPL should exit.
    async fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::New => {
                let id = self
                    .app
                    .conversations
                    .create_conversation(ConversationType::Conversation);
                self.app.session.set_active_tab(Tab::Chatbot);
                println!("{}", format!("Started conversation {id}").green());
            }
            Command::List(filter) => self.print_conversations(filter),
            Command::Switch(id) => {
                match self.app.conversations.set_active_conversation(Some(id.as_str())) {
                    Ok(()) => {
                        self.app.session.set_active_tab(Tab::Chatbot);
                        if let Some(conversation) = self.app.conversations.get_conversation(&id) {
                            print_transcript(&conversation);
                        }
                    }
                    Err(e) => print_error(e),
                }
            }
            Command::Delete(id) => match self.app.conversations.delete_conversation(&id) {
                Ok(()) => println!("{}", format!("Deleted {id}").green()),
                Err(e) => print_error(e),
            },
            Command::Title(title) => match self.app.conversations.active_conversation_id() {
                Some(id) => {
                    if let Err(e) = self.app.conversations.update_title(&id, title) {
                        print_error(e);
                    }
                }
                None => println!("{}", "No active conversation".yellow()),
            },
            Command::Open(path) => self.open(path).await,
            Command::Doc => self.print_document(),
            Command::Select { start, end } => {
                let markdown = self.app.session.markdown().unwrap_or_default();
                match select_range(&markdown, start, end) {
                    Some(text) => {
                        println!("{}", "Selected:".bright_black());
                        println!("{}", text.bright_white());
                        self.app.selection.buffer_selection(text);
                    }
                    None => {
                        self.app.selection.clear_selection();
                        println!("{}", "Empty selection".yellow());
                    }
                }
            }
            Command::Ask => {
                if self.dialog.is_some() {
                    println!("{}", "A question is already open. Type /close first".yellow());
                    return true;
                }
                match self.app.selection.ask_about_selection() {
                    Ok(dialog) => {
                        println!(
                            "{}",
                            "Question opened. Type your question, /close when done."
                                .bright_yellow()
                        );
                        self.dialog = Some(dialog);
                    }
                    Err(e) => print_error(e),
                }
            }
            Command::Close => match self.dialog.take() {
                Some(dialog) => match dialog.close() {
                    Ok(DialogOutcome::Kept) => println!("{}", "Question saved".green()),
                    Ok(DialogOutcome::Discarded) => {
                        println!("{}", "Question discarded".bright_black())
                    }
                    Err(e) => print_error(e),
                },
                None => println!("{}", "No question is open".yellow()),
            },
            Command::Discuss => {
                if !self.app.selection.discuss_in_chat() {
                    println!("{}", "Nothing is selected. Use /select first".yellow());
                }
            }
            Command::Tab => {
                let tab = self.app.session.active_tab().toggled();
                self.app.session.set_active_tab(tab);
                if tab == Tab::Chatbot {
                    if let Some(conversation) = self.app.conversations.active_conversation() {
                        print_transcript(&conversation);
                    }
                }
            }
            Command::Help => print_help(),
            Command::Quit => return false,
            Command::Message(text) => self.send(&text).await,
        }
        true
    }

    async fn send(&mut self, text: &str) {
        let result = match &self.dialog {
            Some(dialog) => dialog.ask(text).await,
            None => {
                self.app.session.set_active_tab(Tab::Chatbot);
                self.app.chat.send(None, text).await
            }
        };

        match result {
            Ok(ChatReply::Answered(message)) => print_message(&message),
            Ok(ChatReply::Failed(message)) => print_message(&message),
            Err(e) => print_error(e),
        }
    }

    async fn open(&self, path: Option<String>) {
        let path = match path {
            Some(path) => Some(path),
            None => self.app.session.last_session_path().await,
        };

        let Some(path) = path else {
            self.app.session.set_markdown(load_sample_markdown());
            println!("{}", "Loaded the sample document".green());
            return;
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(markdown) => {
                self.app.session.set_markdown(markdown);
                self.app.session.save_last_session_path(&path).await;
                self.app.session.set_active_tab(Tab::Markdown);
                println!("{}", format!("Opened {path}").green());
            }
            Err(e) => {
                tracing::warn!("[Repl] Failed to open {}: {}", path, e);
                println!("{}", format!("Failed to open {path}: {e}").red());
            }
        }
    }

    fn print_document(&self) {
        let Some(markdown) = self.app.session.markdown() else {
            println!("{}", "No document loaded".yellow());
            return;
        };

        for (offset, line) in line_offsets(&markdown) {
            println!("{} {}", format!("{offset:>6}").bright_black(), line);
        }
    }

    fn print_conversations(&self, filter: Option<ConversationType>) {
        let active = self.app.conversations.active_conversation_id();
        let conversations = self.app.conversations.list_conversations(filter);
        if conversations.is_empty() {
            println!("{}", "No conversations".bright_black());
            return;
        }

        for conversation in conversations {
            let marker = if active.as_deref() == Some(conversation.id.as_str()) {
                "*"
            } else {
                " "
            };
            println!(
                "{} {} {} {}",
                marker.bright_green(),
                conversation.id.bright_black(),
                format!("[{}]", conversation.conversation_type().as_str()).bright_magenta(),
                conversation.title
            );
        }
    }
}

/// Pairs each line with the character offset it starts at.
///
/// Offsets count the real line terminator, so `\r\n` documents stay
/// aligned with `/select`.
fn line_offsets(markdown: &str) -> Vec<(usize, &str)> {
    let mut offset = 0;
    markdown
        .split_inclusive('\n')
        .map(|raw| {
            let start = offset;
            offset += raw.chars().count();
            let line = raw.strip_suffix('\n').unwrap_or(raw);
            (start, line.strip_suffix('\r').unwrap_or(line))
        })
        .collect()
}

fn print_transcript(conversation: &Conversation) {
    println!("{}", format!("== {} ==", conversation.title).bright_magenta());
    for message in &conversation.messages {
        print_message(message);
    }
}

fn print_message(message: &Message) {
    for line in message.content.lines() {
        match message.role {
            MessageRole::User => println!("{}", format!("> {line}").green()),
            MessageRole::Assistant => println!("{}", line.bright_blue()),
            MessageRole::System => println!("{}", line.yellow()),
        }
    }
}

fn print_error(e: impl std::fmt::Display) {
    eprintln!("{}", format!("Error: {e}").red());
}

fn print_help() {
    let lines = [
        ("/new", "start a new chat"),
        ("/list [chat|question]", "list conversations, newest first"),
        ("/switch <id>", "make a conversation active"),
        ("/delete <id>", "delete a conversation"),
        ("/title <text>", "rename the active conversation"),
        ("/open [path]", "open a markdown file (or the last one)"),
        ("/doc", "print the document with character offsets"),
        ("/select <start> <end>", "select text by character offsets"),
        ("/ask", "ask a question about the selection"),
        ("/close", "close the open question"),
        ("/discuss", "take the selection to the chat"),
        ("/tab", "switch between document and chat"),
        ("/quit", "exit"),
    ];
    for (command, description) in lines {
        println!("  {:<24}{}", command.bright_cyan(), description.bright_black());
    }
    println!("{}", "Any other line is sent as a chat message.".bright_black());
}

/// The main entry point for the notechat readline REPL application.
///
/// Loads configuration, installs logging, bootstraps the stores from the
/// file-backed key-value store and runs the REPL until `/quit` or EOF.
#[tokio::main]
async fn main() -> Result<()> {
    // ===== Configuration & Logging =====
    let paths = NotechatPaths::resolve()?;
    let _log_guard = init_logging(&paths.logs_dir());

    let config_service = ConfigService::new(paths);
    let config = config_service.get_config();
    let storage_dir = config_service.storage_dir();
    tracing::info!("[Main] Using storage at {}", storage_dir.display());

    // ===== Backend Initialization =====
    let completion: Arc<dyn CompletionClient> = match create_completion_client(&config.completion)
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("[Main] Falling back to simulated completions: {}", e);
            println!("{}", format!("{e}. Using simulated replies.").yellow());
            Arc::new(SimulatedCompletionClient::default())
        }
    };
    let storage = Arc::new(FileKeyValueStore::new(storage_dir));
    let app = bootstrap(storage, completion, &config).await;

    // ===== REPL Setup =====
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== notechat ===".bright_magenta().bold());
    println!("{}", "Type /help for commands, /quit to exit.".bright_black());
    println!();

    let mut repl = Repl { app, dialog: None };

    // ===== Main REPL Loop =====
    loop {
        let prompt = repl.prompt();
        // A pending highlight pre-fills the chat prompt once.
        let draft = match repl.app.session.active_tab() {
            Tab::Chatbot if repl.dialog.is_none() => repl
                .app
                .session
                .take_highlight_context()
                .map(|text| draft_from_highlight(&text)),
            _ => None,
        };
        let readline = match draft {
            Some(draft) => rl.readline_with_initial(&prompt, (draft.as_str(), "")),
            None => rl.readline(&prompt),
        };

        match readline {
            Ok(line) => {
                let command = match Command::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(message) => {
                        println!("{}", message.yellow());
                        continue;
                    }
                };
                let _ = rl.add_history_entry(line.as_str());

                if !repl.execute(command).await {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    if let Some(dialog) = repl.dialog.take() {
        if let Err(e) = dialog.close() {
            tracing::warn!("[Main] Failed to close question: {}", e);
        }
    }
    repl.app.flush().await;

    Ok(())
}
