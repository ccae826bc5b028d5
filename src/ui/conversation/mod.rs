//! Conversation UI components for the chat interface

pub mod commands;
pub mod composer;
pub mod history;
pub mod manager;
pub mod markdown;
pub mod status;

pub use commands::{ParsedCommand, SlashCommand, get_help_text};
pub use composer::ConversationComposer;
pub use history::HistoryView;
pub use manager::{ConversationAction, ConversationManager};
pub use status::StatusBar;
