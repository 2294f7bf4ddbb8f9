//! Conversation UI components for chat interface

pub mod commands;
pub mod composer;
pub mod history;
pub mod loading;

pub use commands::{ParsedCommand, SlashCommand, help_lines};
pub use composer::{ComposerResult, ConversationComposer};
pub use history::ConversationHistory;
