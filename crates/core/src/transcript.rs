//! Transcript reconstruction from materialized lineage.
//!
//! A node's `path` already lists every ancestor in order, so rebuilding the
//! conversation leading to a node is O(depth): walk the path and emit the
//! user/assistant pair stored on each ancestor. The total tree size never
//! matters.

use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::node::Node;
use crate::types::NodeId;

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

/// Speaker role for a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Developer,
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reconstruction
// ---------------------------------------------------------------------------

/// The fixed two-entry preamble: developer instruction, assistant greeting.
pub fn preamble(config: &ChatConfig) -> Vec<ChatMessage> {
    vec![
        ChatMessage::new(Role::Developer, config.prompt.clone()),
        ChatMessage::new(Role::Assistant, config.initial_message.clone()),
    ]
}

/// Rebuild the ordered transcript leading to `node_id`.
///
/// Returns the preamble alone when the collection is empty or the target is
/// unknown (the "no conversation yet" case). Path entries that no longer
/// resolve to a node are skipped.
pub fn reconstruct_messages(
    node_id: NodeId,
    nodes: &[Node],
    config: &ChatConfig,
) -> Vec<ChatMessage> {
    let mut messages = preamble(config);

    let by_id: std::collections::HashMap<NodeId, &Node> =
        nodes.iter().map(|n| (n.id, n)).collect();

    let Some(target) = by_id.get(&node_id) else {
        return messages;
    };

    for path_id in &target.path {
        if let Some(node) = by_id.get(path_id) {
            messages.push(ChatMessage::new(Role::User, node.user_message.clone()));
            messages.push(ChatMessage::new(
                Role::Assistant,
                node.assistant_message.clone(),
            ));
        }
    }

    messages
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
