//! Interview Coach, a chat bot for interview preparation.

pub mod channels;
pub mod coach;
pub mod config;
pub mod dispatcher;
pub mod document;
pub mod error;
pub mod format;
pub mod llm;
pub mod replies;
pub mod routes;
pub mod runner;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
