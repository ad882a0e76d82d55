//! Domain core for tangent: the branching conversation tree and its layout.
//!
//! Everything in this crate is pure computation over in-memory snapshots:
//! no I/O, no storage, no HTTP. The `tangent-store` crate layers node
//! lifecycle on top of a storage collaborator; this crate defines the
//! models, invariants, transcript reconstruction, and the layout engines.

pub mod config;
pub mod error;
pub mod layout;
pub mod node;
pub mod transcript;
pub mod tree;
pub mod types;

pub use error::CoreError;
pub use node::{Conversation, Node};
pub use types::{ConversationId, NodeId, Timestamp};
