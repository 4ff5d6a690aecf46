//! Conversation repository trait.
//!
//! Defines the interface for persisting whole conversation snapshots.

use super::state::ConversationState;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for conversation snapshots.
///
/// The store writes its complete state on every mutation, so
/// implementations only need to replace one stored value atomically.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Loads the persisted snapshot.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(state))`: A snapshot was stored
    /// - `Ok(None)`: Nothing has been persisted yet
    /// - `Err(_)`: Error occurred during retrieval or decoding
    async fn load(&self) -> Result<Option<ConversationState>>;

    /// Replaces the persisted snapshot.
    async fn save(&self, state: &ConversationState) -> Result<()>;
}
