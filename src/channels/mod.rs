//! Channel abstraction for message I/O.

pub mod cli;
pub mod telegram;
pub mod transport;

pub use cli::CliChannel;
pub use telegram::{TelegramChannel, TelegramConfig};
pub use transport::*;
