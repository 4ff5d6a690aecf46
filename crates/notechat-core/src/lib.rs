//! Core domain of notechat: conversations, the viewer session, and the
//! collaborator traits they depend on.

pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod session;
pub mod storage;

// Re-export common error type
pub use error::NotechatError;
