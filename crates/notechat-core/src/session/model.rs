//! Session domain model.
//!
//! The session is the viewer's state: the loaded markdown document plus
//! transient view state that is never persisted.

use serde::{Deserialize, Serialize};

/// The two top-level views of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    /// The markdown viewer.
    #[default]
    Markdown,
    /// The chat view.
    Chatbot,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Markdown => "markdown",
            Tab::Chatbot => "chatbot",
        }
    }

    /// Returns the other tab.
    pub fn toggled(self) -> Self {
        match self {
            Tab::Markdown => Tab::Chatbot,
            Tab::Chatbot => Tab::Markdown,
        }
    }
}

/// Current session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// The loaded markdown document (persisted)
    pub markdown: Option<String>,
    /// The visible tab (not persisted)
    pub active_tab: Tab,
    /// Text highlighted in the viewer, waiting to seed a question (not persisted)
    pub highlight_context: Option<String>,
}
