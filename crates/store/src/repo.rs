//! Storage collaborator traits.
//!
//! The persistence engine is external to this system; these traits describe
//! exactly the surface the node lifecycle needs from it: create, find by
//! id, find many by conversation, and field-level updates. Implementations
//! must be safe to share across tasks.

use async_trait::async_trait;
use tangent_core::error::CoreError;
use tangent_core::node::{Conversation, Node};
use tangent_core::types::{ConversationId, NodeId};

/// Node persistence surface.
#[async_trait]
pub trait NodeRepo: Send + Sync {
    /// Persist a freshly created node, returning the stored record.
    async fn insert(&self, node: Node) -> Result<Node, CoreError>;

    /// Fetch a node by id, hidden nodes included.
    async fn find_by_id(&self, id: NodeId) -> Result<Option<Node>, CoreError>;

    /// All nodes of a conversation (hidden included), ordered by creation.
    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Node>, CoreError>;

    /// Visible nodes of a conversation, ordered by creation.
    async fn list_visible(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Node>, CoreError>;

    /// Overwrite a node's coordinates. Returns the updated record, or
    /// `None` if the node does not exist.
    async fn set_position(&self, id: NodeId, x: f64, y: f64)
        -> Result<Option<Node>, CoreError>;

    /// Overwrite a node's width. Range checking is the caller's concern.
    async fn set_width(&self, id: NodeId, width: f64) -> Result<Option<Node>, CoreError>;

    /// Toggle a node's pinned flag.
    async fn set_pinned(&self, id: NodeId, is_pinned: bool)
        -> Result<Option<Node>, CoreError>;

    /// Hide every listed node in one batch. Ids that no longer resolve are
    /// skipped. Returns the number of nodes actually hidden.
    async fn hide_many(&self, ids: &[NodeId]) -> Result<u64, CoreError>;
}

/// Conversation persistence surface.
#[async_trait]
pub trait ConversationRepo: Send + Sync {
    /// Persist a new conversation, returning the stored record.
    async fn insert(&self, conversation: Conversation) -> Result<Conversation, CoreError>;

    /// Fetch a conversation by id.
    async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, CoreError>;

    /// Overwrite the derived title. Returns the updated record, or `None`
    /// if the conversation does not exist.
    async fn set_title(
        &self,
        id: ConversationId,
        title: &str,
    ) -> Result<Option<Conversation>, CoreError>;

    /// Move the advisory resume pointer.
    async fn set_last_active_node(
        &self,
        id: ConversationId,
        node_id: Option<NodeId>,
    ) -> Result<Option<Conversation>, CoreError>;
}
