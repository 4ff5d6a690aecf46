//! Session domain module.
//!
//! Tracks the currently displayed markdown document, the active tab, and
//! the highlighted-text buffer used to seed questions.

mod model;
mod store;

pub use model::{SessionState, Tab};
pub use store::SessionStore;
