pub mod conversation;
pub mod header;
pub mod terminal;

pub use header::Header;
