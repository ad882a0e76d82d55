//! Tree structure helpers: width bounds, adjacency index, lineage checks.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::types::NodeId;

// ---------------------------------------------------------------------------
// Width bounds
// ---------------------------------------------------------------------------

/// Minimum allowed node width in pixels.
pub const MIN_NODE_WIDTH: f64 = 150.0;

/// Maximum allowed node width in pixels.
pub const MAX_NODE_WIDTH: f64 = 800.0;

/// Width assigned when a caller omits one.
pub const DEFAULT_NODE_WIDTH: f64 = 250.0;

/// Validate that a node width is within [`MIN_NODE_WIDTH`, `MAX_NODE_WIDTH`].
pub fn validate_width(width: f64) -> Result<(), CoreError> {
    if !width.is_finite() || width < MIN_NODE_WIDTH || width > MAX_NODE_WIDTH {
        return Err(CoreError::Validation(format!(
            "Width must be between {MIN_NODE_WIDTH} and {MAX_NODE_WIDTH} pixels. Got: {width}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Children index
// ---------------------------------------------------------------------------

/// Adjacency view over a flat node collection: children grouped by parent,
/// plus the set of roots. Rebuilt on demand from a snapshot; never stored.
#[derive(Debug, Default, Clone)]
pub struct ChildrenIndex {
    children: HashMap<NodeId, Vec<NodeId>>,
    roots: Vec<NodeId>,
}

impl ChildrenIndex {
    /// Child ids of `parent`, in snapshot order.
    pub fn children_of(&self, parent: NodeId) -> &[NodeId] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Root ids (nodes with no parent), in snapshot order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Total number of parent entries with at least one child.
    pub fn parent_count(&self) -> usize {
        self.children.len()
    }
}

/// Build a [`ChildrenIndex`] in a single pass over `(id, parent_id)` pairs.
pub fn build_children_index<I>(nodes: I) -> ChildrenIndex
where
    I: IntoIterator<Item = (NodeId, Option<NodeId>)>,
{
    let mut index = ChildrenIndex::default();
    for (id, parent_id) in nodes {
        match parent_id {
            Some(parent) => index.children.entry(parent).or_default().push(id),
            None => index.roots.push(id),
        }
    }
    index
}

// ---------------------------------------------------------------------------
// Lineage
// ---------------------------------------------------------------------------

/// Returns `true` if `ancestor` appears anywhere in `path`.
///
/// Because `path` is the full ancestor chain including the node itself, the
/// subtree rooted at X is exactly the set of nodes whose path contains X;
/// no recursive traversal is needed to collect descendants.
pub fn lineage_contains(path: &[NodeId], ancestor: NodeId) -> bool {
    path.contains(&ancestor)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn id() -> NodeId {
        Uuid::new_v4()
    }

    // -- validate_width ------------------------------------------------------

    #[test]
    fn accepts_bounds_inclusive() {
        assert!(validate_width(150.0).is_ok());
        assert!(validate_width(800.0).is_ok());
        assert!(validate_width(DEFAULT_NODE_WIDTH).is_ok());
    }

    #[test]
    fn rejects_out_of_bounds() {
        assert!(validate_width(149.0).is_err());
        assert!(validate_width(801.0).is_err());
        assert!(validate_width(0.0).is_err());
        assert!(validate_width(-250.0).is_err());
    }

    #[test]
    fn rejects_non_finite() {
        assert!(validate_width(f64::NAN).is_err());
        assert!(validate_width(f64::INFINITY).is_err());
    }

    // -- build_children_index ------------------------------------------------

    #[test]
    fn groups_children_by_parent() {
        let root = id();
        let a = id();
        let b = id();
        let c = id();
        let index = build_children_index(vec![
            (root, None),
            (a, Some(root)),
            (b, Some(a)),
            (c, Some(root)),
        ]);

        assert_eq!(index.roots(), &[root]);
        assert_eq!(index.children_of(root), &[a, c]);
        assert_eq!(index.children_of(a), &[b]);
        assert!(index.children_of(b).is_empty());
    }

    #[test]
    fn multiple_roots_preserve_order() {
        let r1 = id();
        let r2 = id();
        let index = build_children_index(vec![(r1, None), (r2, None)]);
        assert_eq!(index.roots(), &[r1, r2]);
        assert_eq!(index.parent_count(), 0);
    }

    #[test]
    fn empty_collection_yields_empty_index() {
        let index = build_children_index(std::iter::empty());
        assert!(index.roots().is_empty());
        assert_eq!(index.parent_count(), 0);
    }

    // -- lineage_contains ----------------------------------------------------

    #[test]
    fn lineage_matches_ancestors_and_self() {
        let r = id();
        let a = id();
        let b = id();
        let path = vec![r, a, b];

        assert!(lineage_contains(&path, r));
        assert!(lineage_contains(&path, a));
        assert!(lineage_contains(&path, b));
        assert!(!lineage_contains(&path, id()));
    }
}
