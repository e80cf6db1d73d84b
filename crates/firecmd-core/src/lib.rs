//! Orchestration logic and service trait definitions for the fire-command
//! assistant.
//!
//! This crate defines the "ports" (provider, embedder, vector index and
//! memory store traits) that `firecmd-infra` implements, plus everything
//! that needs no I/O of its own: the agent loop, memory hooks, the tool set
//! and the gateway's stream payload extraction. It depends only on
//! `firecmd-types` -- never on `firecmd-infra` or any HTTP crate.

pub mod agent;
pub mod event;
pub mod gateway;
pub mod hooks;
pub mod llm;
pub mod memory;
pub mod tool;
pub mod vector;

#[cfg(test)]
pub(crate) mod testing;
