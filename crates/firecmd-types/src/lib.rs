//! Shared domain types for the fire-command assistant.
//!
//! Conversation messages, memory turns, vector records, tool failures,
//! map event tags and configuration live here so every other crate agrees
//! on their shape.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod agent;
pub mod config;
pub mod error;
pub mod event;
pub mod llm;
pub mod memory;
pub mod tool;
pub mod vector;
