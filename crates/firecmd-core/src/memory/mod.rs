//! Conversation memory.
//!
//! `MemoryStore` is the port to the managed memory service: short-term
//! events per (actor, session) and long-term records per actor namespace.
//! `MemorySessionManager` is built once at startup and hands out
//! `MemorySession`s bound to one session key.

pub mod box_store;
pub mod session;
pub mod store;
