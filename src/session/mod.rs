//! Conversation sessions: per-conversation state, the dialogue state
//! machine that interprets free text, and the store that owns both.

pub mod machine;
pub mod state;
pub mod store;

pub use machine::{Effect, apply};
pub use state::{ConversationId, ConversationState, Mode, split_list};
pub use store::{ConversationStore, SharedState, Snapshot};
