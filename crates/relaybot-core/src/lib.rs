//! Core domain + application logic for the support relay bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind the
//! `Channel` port implemented in the adapter crate.

pub mod audit;
pub mod channel;
pub mod config;
pub mod content;
pub mod conversation;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod fanout;
pub mod header;
pub mod locks;
pub mod logging;
pub mod reply_router;
pub mod reply_table;
pub mod texts;

pub use errors::{Error, Result};
