/// Node identifiers are random UUIDs minted at creation time.
pub type NodeId = uuid::Uuid;

/// Conversation identifiers are random UUIDs.
pub type ConversationId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
