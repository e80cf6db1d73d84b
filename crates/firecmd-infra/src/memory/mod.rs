//! Managed conversation memory.

pub mod agentcore;
