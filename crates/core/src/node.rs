//! Node and conversation models.
//!
//! A [`Node`] records one user/assistant exchange plus its canvas position
//! and materialized lineage. Nodes form a tree per conversation: each node
//! optionally points at a parent, and `path` holds the full ancestor chain
//! (root first, the node itself last), frozen when the node is created.

use serde::{Deserialize, Serialize};

use crate::types::{ConversationId, NodeId, Timestamp};

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One exchange in a conversation tree.
///
/// After creation only `x`, `y`, `width`, `is_pinned`, and `visible` are ever
/// mutated. `visible` moves in one direction only: once a node is hidden by a
/// subtree soft delete it never becomes visible again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub conversation_id: ConversationId,
    /// `None` marks a root node.
    pub parent_id: Option<NodeId>,
    pub user_message: String,
    pub assistant_message: String,
    /// Short caller-supplied digest of the exchange, used for titles.
    pub summary: Option<String>,
    /// Top-left canvas coordinates.
    pub x: f64,
    pub y: f64,
    /// Render width in pixels, always within the configured bounds.
    pub width: f64,
    /// Pinned nodes keep their stored coordinates through every layout pass.
    pub is_pinned: bool,
    /// Ancestor ids root→self inclusive; `path.last() == Some(&id)`.
    pub path: Vec<NodeId>,
    /// Soft-delete flag.
    pub visible: bool,
    pub created_at: Timestamp,
}

impl Node {
    /// Returns `true` for nodes with no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// A conversation owning a tree of nodes.
///
/// `last_active_node_id` is an advisory resume pointer: it may reference a
/// node that has since been hidden, so callers must validate it before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: Option<String>,
    pub last_active_node_id: Option<NodeId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
