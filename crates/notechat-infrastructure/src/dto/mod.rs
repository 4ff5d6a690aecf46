//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs represent the versioned schema for persisting data.
//! They are private to the infrastructure layer and handle the evolution
//! of the storage format over time.
//!
//! ### ConversationState Version History
//! - **1.0.0**: Initial schema, records may omit `type`
//! - **1.1.0**: `type` is required on every record

mod conversation;

pub use conversation::{
    CONVERSATION_STATE_ENTITY, ConversationRecordV1_0_0, ConversationRecordV1_1_0,
    ConversationStateV1_0_0, ConversationStateV1_1_0, ConversationTypeDTO,
    create_conversation_state_migrator,
};
