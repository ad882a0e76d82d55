//! Input DTOs for node lifecycle operations.

use serde::Deserialize;
use tangent_core::types::{ConversationId, NodeId};

/// Input for creating a node from one finalized user/assistant exchange.
///
/// The completion transport finalizes the message pair before this input is
/// built; the store never sees partial tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNode {
    pub conversation_id: ConversationId,
    /// `None` creates a new root.
    pub parent_id: Option<NodeId>,
    pub user_message: String,
    pub assistant_message: String,
    /// Digest produced by the caller's summarizer collaborator, if any.
    #[serde(default)]
    pub summary: Option<String>,
    pub x: f64,
    pub y: f64,
    /// Defaults to the standard node width when omitted.
    #[serde(default)]
    pub width: Option<f64>,
    /// Defaults to `false`.
    #[serde(default)]
    pub is_pinned: Option<bool>,
}

/// One entry of a position batch update.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PositionUpdate {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

/// One entry of a width batch update.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WidthUpdate {
    pub id: NodeId,
    pub width: f64,
}
