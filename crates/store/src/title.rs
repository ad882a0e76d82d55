//! Derived conversation titles.
//!
//! A conversation is titled after the summary of its first visible root
//! node. Title refresh is a side effect of root creation and deletion; it
//! must never fail the triggering operation, so every error in here is
//! logged and swallowed.

use std::sync::OnceLock;

use regex::Regex;

use tangent_core::types::ConversationId;

use crate::repo::{ConversationRepo, NodeRepo};

/// Title used when a conversation has no visible root or no usable summary.
pub const UNTITLED: &str = "Untitled Conversation";

/// Titles longer than this are truncated with an ellipsis.
pub const MAX_TITLE_LENGTH: usize = 255;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"))
}

/// Reduce content to plain text: strip markup tags, trim whitespace.
pub fn sanitize_content(content: &str) -> String {
    tag_pattern().replace_all(content, "").trim().to_string()
}

/// Derive a display title from a root node's summary.
///
/// Empty or whitespace-only summaries (before or after sanitization) fall
/// back to [`UNTITLED`]; anything longer than [`MAX_TITLE_LENGTH`] is cut to
/// 252 characters plus `...`.
pub fn compute_title_from_summary(summary: Option<&str>) -> String {
    let Some(summary) = summary else {
        return UNTITLED.to_string();
    };
    if summary.trim().is_empty() {
        return UNTITLED.to_string();
    }

    let sanitized = sanitize_content(summary);
    if sanitized.is_empty() {
        return UNTITLED.to_string();
    }

    if sanitized.chars().count() > MAX_TITLE_LENGTH {
        let truncated: String = sanitized.chars().take(MAX_TITLE_LENGTH - 3).collect();
        return format!("{truncated}...");
    }

    sanitized
}

/// Recompute and persist a conversation's title from its current visible
/// root. Never propagates failure.
pub async fn refresh_conversation_title(
    nodes: &dyn NodeRepo,
    conversations: &dyn ConversationRepo,
    conversation_id: ConversationId,
) {
    let root_summary = match nodes.list_visible(conversation_id).await {
        Ok(visible) => visible
            .into_iter()
            .find(|n| n.is_root())
            .and_then(|root| root.summary),
        Err(err) => {
            tracing::error!(
                conversation_id = %conversation_id,
                error = %err,
                "Failed to load nodes for title refresh"
            );
            return;
        }
    };

    let title = compute_title_from_summary(root_summary.as_deref());

    match conversations.set_title(conversation_id, &title).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            tracing::warn!(
                conversation_id = %conversation_id,
                "Title refresh targeted a missing conversation"
            );
        }
        Err(err) => {
            tracing::error!(
                conversation_id = %conversation_id,
                error = %err,
                "Failed to update conversation title"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
