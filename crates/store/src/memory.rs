//! In-memory reference implementation of the storage traits.
//!
//! Stands in for the external persistence engine in tests and embedded
//! use. Interior mutability via `RwLock`; every method takes a short
//! critical section and never holds a lock across an await point.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use tangent_core::error::CoreError;
use tangent_core::node::{Conversation, Node};
use tangent_core::types::{ConversationId, NodeId};

use crate::repo::{ConversationRepo, NodeRepo};

/// Shared in-memory store backing both repository traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: RwLock<HashMap<NodeId, Node>>,
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes, hidden included. Test helper.
    pub async fn node_count(&self) -> usize {
        self.nodes.read().await.len()
    }
}

fn by_creation(nodes: &mut Vec<Node>) {
    nodes.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait]
impl NodeRepo for MemoryStore {
    async fn insert(&self, node: Node) -> Result<Node, CoreError> {
        let mut nodes = self.nodes.write().await;
        nodes.insert(node.id, node.clone());
        Ok(node)
    }

    async fn find_by_id(&self, id: NodeId) -> Result<Option<Node>, CoreError> {
        Ok(self.nodes.read().await.get(&id).cloned())
    }

    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Node>, CoreError> {
        let nodes = self.nodes.read().await;
        let mut matching: Vec<Node> = nodes
            .values()
            .filter(|n| n.conversation_id == conversation_id)
            .cloned()
            .collect();
        by_creation(&mut matching);
        Ok(matching)
    }

    async fn list_visible(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Node>, CoreError> {
        let nodes = self.nodes.read().await;
        let mut matching: Vec<Node> = nodes
            .values()
            .filter(|n| n.conversation_id == conversation_id && n.visible)
            .cloned()
            .collect();
        by_creation(&mut matching);
        Ok(matching)
    }

    async fn set_position(
        &self,
        id: NodeId,
        x: f64,
        y: f64,
    ) -> Result<Option<Node>, CoreError> {
        let mut nodes = self.nodes.write().await;
        Ok(nodes.get_mut(&id).map(|node| {
            node.x = x;
            node.y = y;
            node.clone()
        }))
    }

    async fn set_width(&self, id: NodeId, width: f64) -> Result<Option<Node>, CoreError> {
        let mut nodes = self.nodes.write().await;
        Ok(nodes.get_mut(&id).map(|node| {
            node.width = width;
            node.clone()
        }))
    }

    async fn set_pinned(
        &self,
        id: NodeId,
        is_pinned: bool,
    ) -> Result<Option<Node>, CoreError> {
        let mut nodes = self.nodes.write().await;
        Ok(nodes.get_mut(&id).map(|node| {
            node.is_pinned = is_pinned;
            node.clone()
        }))
    }

    async fn hide_many(&self, ids: &[NodeId]) -> Result<u64, CoreError> {
        let mut nodes = self.nodes.write().await;
        let mut hidden = 0u64;
        for id in ids {
            if let Some(node) = nodes.get_mut(id) {
                if node.visible {
                    node.visible = false;
                    hidden += 1;
                }
            }
        }
        Ok(hidden)
    }
}

#[async_trait]
impl ConversationRepo for MemoryStore {
    async fn insert(&self, conversation: Conversation) -> Result<Conversation, CoreError> {
        let mut conversations = self.conversations.write().await;
        conversations.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, CoreError> {
        Ok(self.conversations.read().await.get(&id).cloned())
    }

    async fn set_title(
        &self,
        id: ConversationId,
        title: &str,
    ) -> Result<Option<Conversation>, CoreError> {
        let mut conversations = self.conversations.write().await;
        Ok(conversations.get_mut(&id).map(|conversation| {
            conversation.title = Some(title.to_string());
            conversation.updated_at = chrono::Utc::now();
            conversation.clone()
        }))
    }

    async fn set_last_active_node(
        &self,
        id: ConversationId,
        node_id: Option<NodeId>,
    ) -> Result<Option<Conversation>, CoreError> {
        let mut conversations = self.conversations.write().await;
        Ok(conversations.get_mut(&id).map(|conversation| {
            conversation.last_active_node_id = node_id;
            conversation.updated_at = chrono::Utc::now();
            conversation.clone()
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
