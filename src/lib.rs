//! nova - terminal chat client for OpenRouter completion models.
//!
//! Conversations are kept as named sessions in a local key-value store and
//! every user turn is forwarded, optionally with an attached file, as a
//! single completion request.

pub mod attachment;
pub mod cli;
pub mod completion;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
