//! Terminal chat client for a remote markdown-answering endpoint.

pub mod app;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod markdown;
pub mod theme;
pub mod transport;
pub mod ui;

pub use conversation::{Conversation, Message, Role};
pub use dispatcher::{Dispatcher, FALLBACK_REPLY, Rejection, SubmitOutcome};
pub use error::DispatchError;
pub use transport::{ChatTransport, HttpTransport};
