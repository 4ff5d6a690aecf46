//! Persistence building blocks shared by the stores.

mod key_value;
mod writer;

pub use key_value::{
    CONVERSATION_STORAGE_KEY, KeyValueStore, SESSION_LAST_PATH_KEY, SESSION_MARKDOWN_KEY,
};
pub use writer::BackgroundWriter;
