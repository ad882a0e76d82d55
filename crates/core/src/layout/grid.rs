//! Deterministic square-grid layout, used as the emergency fallback.

use crate::layout::{
    LayoutEdge, LayoutEngine, LayoutError, LayoutNode, LayoutOptions, Position, PositionMap,
    DEFAULT_NODE_HEIGHT, HORIZONTAL_PADDING, VERTICAL_PADDING,
};
use crate::tree::DEFAULT_NODE_WIDTH;

/// Order-preserving grid placement: `ceil(sqrt(n))` columns, input index
/// decides the cell. Ignores edges and options entirely, so it cannot fail.
#[derive(Debug, Default)]
pub struct GridLayoutEngine;

impl GridLayoutEngine {
    /// Place `nodes` on the grid. Infallible companion to the trait method.
    pub fn place(nodes: &[LayoutNode]) -> PositionMap {
        let cols = (nodes.len() as f64).sqrt().ceil() as usize;
        let cell_width = DEFAULT_NODE_WIDTH + HORIZONTAL_PADDING;
        let cell_height = DEFAULT_NODE_HEIGHT + VERTICAL_PADDING;

        nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let col = index % cols.max(1);
                let row = index / cols.max(1);
                (
                    node.id,
                    Position {
                        x: col as f64 * cell_width,
                        y: row as f64 * cell_height,
                    },
                )
            })
            .collect()
    }
}

impl LayoutEngine for GridLayoutEngine {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn calculate(
        &self,
        nodes: &[LayoutNode],
        _edges: &[LayoutEdge],
        _options: &LayoutOptions,
    ) -> Result<PositionMap, LayoutError> {
        Ok(Self::place(nodes))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
