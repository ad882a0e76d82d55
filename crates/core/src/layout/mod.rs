//! Automatic graph layout for conversation trees.
//!
//! The layout subsystem is pure: every entry point is a function of the
//! snapshot passed in, holds no state between calls, and performs no I/O.
//! [`service::LayoutService`] orchestrates pinned-node partitioning and
//! fallback handling; engines implement the [`LayoutEngine`] strategy trait.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::NodeId;

pub mod grid;
pub mod rank;
pub mod service;

pub use grid::GridLayoutEngine;
pub use rank::RankLayoutEngine;
pub use service::{LayoutMetadata, LayoutOutcome, LayoutService};

// ---------------------------------------------------------------------------
// Spacing constants
// ---------------------------------------------------------------------------

/// Height assumed for nodes whose render size has not been measured.
pub const DEFAULT_NODE_HEIGHT: f64 = 100.0;

/// Fixed padding added to horizontal extents before density scaling.
pub const HORIZONTAL_PADDING: f64 = 40.0;

/// Fixed padding added to vertical extents before density scaling.
pub const VERTICAL_PADDING: f64 = 20.0;

/// Margin applied around the finished drawing.
pub const LAYOUT_MARGIN: f64 = 20.0;

/// Extra rank separation in left-right layouts, reserving room for arrows.
pub const LEFT_RIGHT_RANK_FACTOR: f64 = 1.8;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Growth direction of the tree: where ranks advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Ranks advance downward; siblings spread horizontally.
    #[default]
    TopDown,
    /// Ranks advance rightward; siblings spread vertically.
    LeftRight,
    /// Ranks advance upward.
    BottomUp,
    /// Ranks advance leftward.
    RightLeft,
}

impl Direction {
    /// `true` when the rank axis is horizontal (left-right / right-left).
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::LeftRight | Direction::RightLeft)
    }

    /// `true` when ranks advance toward negative coordinates.
    pub fn is_reversed(self) -> bool {
        matches!(self, Direction::BottomUp | Direction::RightLeft)
    }
}

/// Spacing density preset, scaling sibling- and rank-axis separation
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Density {
    Compact,
    #[default]
    Normal,
    Spacious,
}

impl Density {
    /// Multiplier applied to separation along the sibling axis.
    pub fn sibling_multiplier(self) -> f64 {
        match self {
            Density::Compact => 0.8,
            Density::Normal => 1.0,
            Density::Spacious => 1.3,
        }
    }

    /// Multiplier applied to separation along the rank axis.
    pub fn rank_multiplier(self) -> f64 {
        match self {
            Density::Compact => 0.7,
            Density::Normal => 1.0,
            Density::Spacious => 1.5,
        }
    }
}

/// Per-call layout options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutOptions {
    pub direction: Direction,
    pub density: Density,
}

// ---------------------------------------------------------------------------
// Graph input / output
// ---------------------------------------------------------------------------

/// Layout view of a node: identity, stored position, measured render size,
/// and the pinned flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutNode {
    pub id: NodeId,
    /// Stored top-left coordinates, authoritative for pinned nodes.
    pub x: f64,
    pub y: f64,
    /// Measured render width, or `None` when unmeasured.
    pub width: Option<f64>,
    /// Measured render height, or `None` when unmeasured.
    pub height: Option<f64>,
    pub is_pinned: bool,
}

impl LayoutNode {
    pub fn width_or_default(&self) -> f64 {
        self.width.unwrap_or(crate::tree::DEFAULT_NODE_WIDTH)
    }

    pub fn height_or_default(&self) -> f64 {
        self.height.unwrap_or(DEFAULT_NODE_HEIGHT)
    }

    /// Layout view of a stored node. `height` is the measured render
    /// height, if the caller has one.
    pub fn from_node(node: &crate::node::Node, height: Option<f64>) -> Self {
        Self {
            id: node.id,
            x: node.x,
            y: node.y,
            width: Some(node.width),
            height,
            is_pinned: node.is_pinned,
        }
    }
}

/// A directed parent→child edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEdge {
    pub source: NodeId,
    pub target: NodeId,
}

/// A computed top-left position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Map of node id to computed position.
pub type PositionMap = HashMap<NodeId, Position>;

/// Parent→child edges implied by a node snapshot.
///
/// Edges whose parent is not part of the snapshot (a visible child under a
/// hidden ancestor) are dropped so engines only ever see resolvable
/// endpoints.
pub fn edges_from_nodes(nodes: &[crate::node::Node]) -> Vec<LayoutEdge> {
    let ids: std::collections::HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
    nodes
        .iter()
        .filter_map(|n| {
            n.parent_id
                .filter(|parent| ids.contains(parent))
                .map(|parent| LayoutEdge {
                    source: parent,
                    target: n.id,
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures raised by layout engines. The service downgrades every variant
/// to the grid fallback; none of these surface to callers as hard errors.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("edge references unknown {endpoint} node {node_id}")]
    UnknownNode {
        endpoint: &'static str,
        node_id: NodeId,
    },

    #[error("layout graph contains a cycle involving node {node_id}")]
    CycleDetected { node_id: NodeId },

    #[error("layout engine failure: {0}")]
    Engine(String),
}

// ---------------------------------------------------------------------------
// Strategy trait
// ---------------------------------------------------------------------------

/// A pluggable layout strategy.
///
/// Engines must treat their input as untrusted: the default rank engine
/// re-validates acyclicity even though the node store only ever produces
/// trees. An engine that fails must return an error rather than panic so the
/// service can substitute the grid fallback.
pub trait LayoutEngine: Send + Sync {
    /// Registry name of this engine.
    fn name(&self) -> &'static str;

    /// Compute top-left positions for every input node.
    fn calculate(
        &self,
        nodes: &[LayoutNode],
        edges: &[LayoutEdge],
        options: &LayoutOptions,
    ) -> Result<PositionMap, LayoutError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_multipliers() {
        assert_eq!(Density::Compact.sibling_multiplier(), 0.8);
        assert_eq!(Density::Compact.rank_multiplier(), 0.7);
        assert_eq!(Density::Normal.sibling_multiplier(), 1.0);
        assert_eq!(Density::Normal.rank_multiplier(), 1.0);
        assert_eq!(Density::Spacious.sibling_multiplier(), 1.3);
        assert_eq!(Density::Spacious.rank_multiplier(), 1.5);
    }

    #[test]
    fn spacious_grows_rank_axis_more_than_sibling_axis() {
        assert!(Density::Spacious.rank_multiplier() > Density::Spacious.sibling_multiplier());
    }

    #[test]
    fn direction_axes() {
        assert!(!Direction::TopDown.is_horizontal());
        assert!(!Direction::BottomUp.is_horizontal());
        assert!(Direction::LeftRight.is_horizontal());
        assert!(Direction::RightLeft.is_horizontal());

        assert!(!Direction::TopDown.is_reversed());
        assert!(Direction::BottomUp.is_reversed());
        assert!(!Direction::LeftRight.is_reversed());
        assert!(Direction::RightLeft.is_reversed());
    }

    #[test]
    fn node_dimension_defaults() {
        let node = LayoutNode {
            id: uuid::Uuid::new_v4(),
            x: 0.0,
            y: 0.0,
            width: None,
            height: None,
            is_pinned: false,
        };
        assert_eq!(node.width_or_default(), 250.0);
        assert_eq!(node.height_or_default(), 100.0);
    }

    #[test]
    fn options_default_to_top_down_normal() {
        let options = LayoutOptions::default();
        assert_eq!(options.direction, Direction::TopDown);
        assert_eq!(options.density, Density::Normal);
    }

    #[test]
    fn layout_view_carries_stored_geometry() {
        let stored = crate::node::Node {
            id: uuid::Uuid::new_v4(),
            conversation_id: uuid::Uuid::new_v4(),
            parent_id: None,
            user_message: String::new(),
            assistant_message: String::new(),
            summary: None,
            x: 12.0,
            y: 34.0,
            width: 300.0,
            is_pinned: true,
            path: vec![],
            visible: true,
            created_at: chrono::Utc::now(),
        };

        let view = LayoutNode::from_node(&stored, Some(180.0));
        assert_eq!(view.id, stored.id);
        assert_eq!((view.x, view.y), (12.0, 34.0));
        assert_eq!(view.width_or_default(), 300.0);
        assert_eq!(view.height_or_default(), 180.0);
        assert!(view.is_pinned);
    }

    #[test]
    fn edges_skip_parents_missing_from_snapshot() {
        fn stored(id: NodeId, parent_id: Option<NodeId>) -> crate::node::Node {
            crate::node::Node {
                id,
                conversation_id: uuid::Uuid::new_v4(),
                parent_id,
                user_message: String::new(),
                assistant_message: String::new(),
                summary: None,
                x: 0.0,
                y: 0.0,
                width: 250.0,
                is_pinned: false,
                path: vec![id],
                visible: true,
                created_at: chrono::Utc::now(),
            }
        }

        let root = uuid::Uuid::new_v4();
        let child = uuid::Uuid::new_v4();
        let orphan = uuid::Uuid::new_v4();
        let nodes = vec![
            stored(root, None),
            stored(child, Some(root)),
            // Parent hidden and absent from the snapshot.
            stored(orphan, Some(uuid::Uuid::new_v4())),
        ];

        let edges = edges_from_nodes(&nodes);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, root);
        assert_eq!(edges[0].target, child);
    }
}
