//! Embedding and vector index abstractions.
//!
//! The station lookup tool and the offline loaders share these ports:
//! text is embedded with an `Embedder`, then queried against or written to a
//! `VectorIndex`.

pub mod box_embedder;
pub mod box_index;
pub mod embedder;
pub mod index;
