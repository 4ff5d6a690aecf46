//! Infrastructure layer for notechat.
//!
//! Key-value storage backends, versioned persistence of the conversation
//! snapshot, configuration loading and platform paths.

pub mod config_service;
pub mod conversation_repository;
pub mod dto;
pub mod paths;
pub mod sample;
pub mod storage;

pub use config_service::ConfigService;
pub use conversation_repository::KvConversationRepository;
pub use paths::NotechatPaths;
pub use storage::{FileKeyValueStore, MemoryKeyValueStore};
