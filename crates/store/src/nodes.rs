//! Node lifecycle service: creation, batch updates, cascading soft delete.
//!
//! Callers enforce a single-writer-per-conversation discipline; this
//! service does no locking of its own. All validation happens before any
//! write, so a failed call leaves storage untouched.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use tangent_core::config::ChatConfig;
use tangent_core::error::CoreError;
use tangent_core::node::{Conversation, Node};
use tangent_core::transcript::{reconstruct_messages, ChatMessage};
use tangent_core::tree::{lineage_contains, validate_width, DEFAULT_NODE_WIDTH};
use tangent_core::types::{ConversationId, NodeId};

use crate::memory::MemoryStore;
use crate::model::{CreateNode, PositionUpdate, WidthUpdate};
use crate::repo::{ConversationRepo, NodeRepo};
use crate::title::refresh_conversation_title;

/// Service owning the node lifecycle for every conversation tree.
#[derive(Clone)]
pub struct NodeStore {
    nodes: Arc<dyn NodeRepo>,
    conversations: Arc<dyn ConversationRepo>,
}

impl NodeStore {
    pub fn new(nodes: Arc<dyn NodeRepo>, conversations: Arc<dyn ConversationRepo>) -> Self {
        Self {
            nodes,
            conversations,
        }
    }

    /// Store backed by a fresh in-memory reference store.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store)
    }

    // -----------------------------------------------------------------------
    // Conversations
    // -----------------------------------------------------------------------

    /// Create an empty conversation.
    pub async fn create_conversation(
        &self,
        title: Option<String>,
    ) -> Result<Conversation, CoreError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            title,
            last_active_node_id: None,
            created_at: now,
            updated_at: now,
        };
        self.conversations.insert(conversation).await
    }

    /// Fetch a conversation by id.
    pub async fn conversation(&self, id: ConversationId) -> Result<Conversation, CoreError> {
        self.require_conversation(id).await
    }

    /// Move the advisory resume pointer.
    ///
    /// A non-null target must be an existing node of the same conversation;
    /// the pointer is allowed to dangle later (it is advisory), but never to
    /// start out pointing at a foreign or missing node.
    pub async fn update_last_active_node(
        &self,
        conversation_id: ConversationId,
        node_id: Option<NodeId>,
    ) -> Result<Conversation, CoreError> {
        self.require_conversation(conversation_id).await?;

        if let Some(node_id) = node_id {
            let valid = self
                .nodes
                .find_by_id(node_id)
                .await?
                .is_some_and(|n| n.conversation_id == conversation_id);
            if !valid {
                return Err(CoreError::Validation("Invalid node reference".to_string()));
            }
        }

        self.conversations
            .set_last_active_node(conversation_id, node_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "conversation",
                id: conversation_id,
            })
    }

    // -----------------------------------------------------------------------
    // Node creation
    // -----------------------------------------------------------------------

    /// Create a node from a finalized exchange, computing and freezing its
    /// lineage.
    pub async fn create_node(&self, input: CreateNode) -> Result<Node, CoreError> {
        self.require_conversation(input.conversation_id).await?;

        if let Some(parent_id) = input.parent_id {
            let parent_ok = self
                .nodes
                .find_by_id(parent_id)
                .await?
                .is_some_and(|p| p.conversation_id == input.conversation_id);
            if !parent_ok {
                return Err(CoreError::NotFound {
                    entity: "node",
                    id: parent_id,
                });
            }
        }

        let width = input.width.unwrap_or(DEFAULT_NODE_WIDTH);
        validate_width(width)?;

        let id = Uuid::new_v4();
        let path = self.compute_path(id, input.parent_id).await?;

        let node = Node {
            id,
            conversation_id: input.conversation_id,
            parent_id: input.parent_id,
            user_message: input.user_message,
            assistant_message: input.assistant_message,
            summary: input.summary,
            x: input.x,
            y: input.y,
            width,
            is_pinned: input.is_pinned.unwrap_or(false),
            path,
            visible: true,
            created_at: Utc::now(),
        };

        let created = self.nodes.insert(node).await?;
        tracing::debug!(node_id = %created.id, depth = created.path.len(), "Node created");

        // A new root changes which summary the conversation is titled
        // after. The refresh must never fail the create.
        if created.is_root() {
            refresh_conversation_title(
                self.nodes.as_ref(),
                self.conversations.as_ref(),
                created.conversation_id,
            )
            .await;
        }

        Ok(created)
    }

    /// Walk the parent chain to the root, collecting ids root-first, then
    /// append the new node's id. O(depth); persisted so reads are O(1).
    async fn compute_path(
        &self,
        id: NodeId,
        parent_id: Option<NodeId>,
    ) -> Result<Vec<NodeId>, CoreError> {
        let mut ancestors = Vec::new();
        let mut current = parent_id;

        while let Some(current_id) = current {
            let parent = self
                .nodes
                .find_by_id(current_id)
                .await?
                .ok_or_else(|| CoreError::Validation("Invalid parent reference".to_string()))?;
            ancestors.push(parent.id);
            current = parent.parent_id;
        }

        ancestors.reverse();
        ancestors.push(id);
        Ok(ancestors)
    }

    // -----------------------------------------------------------------------
    // Batch updates
    // -----------------------------------------------------------------------

    /// Persist dragged positions. The whole batch is validated before any
    /// write; afterwards items apply independently, so replaying a batch is
    /// idempotent.
    pub async fn update_positions(
        &self,
        updates: &[PositionUpdate],
    ) -> Result<Vec<Node>, CoreError> {
        for update in updates {
            self.require_node(update.id).await?;
        }

        let mut applied = Vec::with_capacity(updates.len());
        for update in updates {
            if let Some(node) = self
                .nodes
                .set_position(update.id, update.x, update.y)
                .await?
            {
                applied.push(node);
            }
        }
        Ok(applied)
    }

    /// Persist resized widths. Width bounds are checked for every item, and
    /// every id resolved, before any write happens.
    pub async fn update_widths(&self, updates: &[WidthUpdate]) -> Result<Vec<Node>, CoreError> {
        for update in updates {
            validate_width(update.width)?;
        }
        for update in updates {
            self.require_node(update.id).await?;
        }

        let mut applied = Vec::with_capacity(updates.len());
        for update in updates {
            if let Some(node) = self.nodes.set_width(update.id, update.width).await? {
                applied.push(node);
            }
        }
        Ok(applied)
    }

    /// Toggle a node's pinned flag.
    pub async fn update_pinned(
        &self,
        node_id: NodeId,
        is_pinned: bool,
    ) -> Result<Node, CoreError> {
        self.nodes
            .set_pinned(node_id, is_pinned)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "node",
                id: node_id,
            })
    }

    // -----------------------------------------------------------------------
    // Soft delete
    // -----------------------------------------------------------------------

    /// Hide a node and its entire subtree in one batch.
    ///
    /// The subtree is found by lineage containment: every descendant's path
    /// includes the target id, so one snapshot scan replaces a recursive
    /// traversal. Nodes created concurrently with this pass may not be in
    /// the snapshot and then stay visible; deletion is best-effort under
    /// concurrent writes.
    pub async fn soft_delete_subtree(&self, node_id: NodeId) -> Result<(), CoreError> {
        let target = self.require_node(node_id).await?;
        let was_root = target.is_root();

        let snapshot = self.nodes.list_by_conversation(target.conversation_id).await?;

        let mut to_hide = vec![node_id];
        for node in &snapshot {
            if node.id != node_id && lineage_contains(&node.path, node_id) {
                to_hide.push(node.id);
            }
        }

        let hidden = self.nodes.hide_many(&to_hide).await?;
        tracing::info!(
            node_id = %node_id,
            descendants = to_hide.len() - 1,
            hidden,
            "Soft deleted node subtree"
        );

        // Removing a root can change (or empty out) the title source.
        if was_root {
            refresh_conversation_title(
                self.nodes.as_ref(),
                self.conversations.as_ref(),
                target.conversation_id,
            )
            .await;
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Visible nodes of a conversation, creation order.
    pub async fn visible_nodes(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Node>, CoreError> {
        self.require_conversation(conversation_id).await?;
        self.nodes.list_visible(conversation_id).await
    }

    /// Rebuild the transcript leading to `node_id`.
    pub async fn transcript(
        &self,
        node_id: NodeId,
        config: &ChatConfig,
    ) -> Result<Vec<ChatMessage>, CoreError> {
        let node = self.require_node(node_id).await?;
        let nodes = self.nodes.list_visible(node.conversation_id).await?;
        Ok(reconstruct_messages(node_id, &nodes, config))
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    async fn require_node(&self, id: NodeId) -> Result<Node, CoreError> {
        self.nodes
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "node", id })
    }

    async fn require_conversation(&self, id: ConversationId) -> Result<Conversation, CoreError> {
        self.conversations
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "conversation",
                id,
            })
    }
}
