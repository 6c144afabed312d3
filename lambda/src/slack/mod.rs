//! All Slack-specific functionality

pub mod client;
pub mod command_parser;
pub mod platform;
pub mod response_builder;
pub mod views;

// Re-export main types for convenience
pub use client::SlackClient;
pub use platform::{ChatPlatform, ConversationMessage, HistoryPage, TextFile};
pub use views::Screen;
