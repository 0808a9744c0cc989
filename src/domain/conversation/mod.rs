//! Conversation history owned by a session.

mod turn;
mod window;

pub use turn::{Turn, TurnRole};
pub use window::{ConversationWindow, DEFAULT_WINDOW_TURNS};
