//! CLI command implementations.

pub mod chat;
pub mod delete;
pub mod list;
pub mod new;
pub mod render;
pub mod send;
pub mod setup;
pub mod show;
