//! Rank-based layered layout, the default engine.
//!
//! Nodes are assigned to ranks by longest-path layering over a validated
//! DAG, ordered within each rank by one downward barycenter sweep, then
//! spaced according to the direction and density options. The algorithm
//! works in center-anchored coordinates and converts to the top-left
//! convention the rest of the system uses before returning.

use std::collections::{HashMap, VecDeque};

use crate::layout::{
    Direction, LayoutEdge, LayoutEngine, LayoutError, LayoutNode, LayoutOptions, Position,
    PositionMap, HORIZONTAL_PADDING, LAYOUT_MARGIN, LEFT_RIGHT_RANK_FACTOR, VERTICAL_PADDING,
};

/// Default layout strategy. Stateless; safe to share across calls.
#[derive(Debug, Default)]
pub struct RankLayoutEngine;

impl LayoutEngine for RankLayoutEngine {
    fn name(&self) -> &'static str {
        "rank"
    }

    fn calculate(
        &self,
        nodes: &[LayoutNode],
        edges: &[LayoutEdge],
        options: &LayoutOptions,
    ) -> Result<PositionMap, LayoutError> {
        if nodes.is_empty() {
            return Ok(PositionMap::new());
        }

        let result = layout_ranked(nodes, edges, options);
        if let Err(err) = &result {
            tracing::error!(error = %err, "Rank layout calculation failed");
        }
        result
    }
}

fn layout_ranked(
    nodes: &[LayoutNode],
    edges: &[LayoutEdge],
    options: &LayoutOptions,
) -> Result<PositionMap, LayoutError> {
    let graph = Graph::build(nodes, edges)?;

    if let Some(offender) = graph.find_cycle() {
        return Err(LayoutError::CycleDetected {
            node_id: nodes[offender].id,
        });
    }

    let ranks = graph.assign_ranks();
    let layers = graph.order_layers(&ranks);

    Ok(place(nodes, &layers, options))
}

// ---------------------------------------------------------------------------
// Graph construction and validation
// ---------------------------------------------------------------------------

struct Graph {
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl Graph {
    /// Build index-based adjacency, rejecting edges with unknown endpoints.
    fn build(nodes: &[LayoutNode], edges: &[LayoutEdge]) -> Result<Self, LayoutError> {
        let index: HashMap<_, _> = nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];

        for edge in edges {
            let source = *index.get(&edge.source).ok_or(LayoutError::UnknownNode {
                endpoint: "source",
                node_id: edge.source,
            })?;
            let target = *index.get(&edge.target).ok_or(LayoutError::UnknownNode {
                endpoint: "target",
                node_id: edge.target,
            })?;
            outgoing[source].push(target);
            incoming[target].push(source);
        }

        Ok(Self { outgoing, incoming })
    }

    /// Depth-first cycle search with an explicit recursion-stack set.
    ///
    /// Returns the index of a node on the offending cycle, or `None` for a
    /// valid DAG. Iterative so adversarially deep inputs cannot blow the
    /// call stack.
    fn find_cycle(&self) -> Option<usize> {
        const UNVISITED: u8 = 0;
        const ON_STACK: u8 = 1;
        const DONE: u8 = 2;

        let mut state = vec![UNVISITED; self.outgoing.len()];

        for start in 0..self.outgoing.len() {
            if state[start] != UNVISITED {
                continue;
            }

            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            state[start] = ON_STACK;

            while let Some(frame) = stack.last_mut() {
                let (node, next_child) = *frame;
                if next_child < self.outgoing[node].len() {
                    frame.1 += 1;
                    let child = self.outgoing[node][next_child];
                    match state[child] {
                        UNVISITED => {
                            state[child] = ON_STACK;
                            stack.push((child, 0));
                        }
                        ON_STACK => return Some(child),
                        _ => {}
                    }
                } else {
                    state[node] = DONE;
                    stack.pop();
                }
            }
        }

        None
    }

    /// Longest-path layering: a node's rank is one past its deepest parent.
    ///
    /// Processes nodes in Kahn topological order; callers must have ruled
    /// out cycles first.
    fn assign_ranks(&self) -> Vec<usize> {
        let n = self.outgoing.len();
        let mut indegree: Vec<usize> = self.incoming.iter().map(Vec::len).collect();
        let mut ranks = vec![0usize; n];

        let mut queue: VecDeque<usize> =
            (0..n).filter(|&i| indegree[i] == 0).collect();

        while let Some(node) = queue.pop_front() {
            for &child in &self.outgoing[node] {
                ranks[child] = ranks[child].max(ranks[node] + 1);
                indegree[child] -= 1;
                if indegree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }

        ranks
    }

    /// Group nodes into rank layers and run one downward barycenter sweep.
    ///
    /// Initial within-layer order is input order, so identical input always
    /// produces identical layers. The sweep sorts each layer by the mean
    /// position of its predecessors in the layer above; nodes without
    /// predecessors keep their relative position.
    fn order_layers(&self, ranks: &[usize]) -> Vec<Vec<usize>> {
        let max_rank = ranks.iter().copied().max().unwrap_or(0);
        let mut layers = vec![Vec::new(); max_rank + 1];
        for (node, &rank) in ranks.iter().enumerate() {
            layers[rank].push(node);
        }

        for layer_idx in 1..layers.len() {
            let prev_positions: HashMap<usize, usize> = layers[layer_idx - 1]
                .iter()
                .enumerate()
                .map(|(pos, &node)| (node, pos))
                .collect();

            let current = &mut layers[layer_idx];
            let keys: HashMap<usize, f64> = current
                .iter()
                .enumerate()
                .map(|(own_pos, &node)| {
                    let positions: Vec<f64> = self.incoming[node]
                        .iter()
                        .filter_map(|p| prev_positions.get(p))
                        .map(|&p| p as f64)
                        .collect();
                    let key = if positions.is_empty() {
                        own_pos as f64
                    } else {
                        positions.iter().sum::<f64>() / positions.len() as f64
                    };
                    (node, key)
                })
                .collect();

            current.sort_by(|a, b| {
                keys[a]
                    .partial_cmp(&keys[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        layers
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// Separation along each tree axis, derived from direction and density.
struct Spacing {
    sibling: f64,
    rank: f64,
}

impl Spacing {
    fn derive(nodes: &[LayoutNode], options: &LayoutOptions) -> Self {
        let count = nodes.len() as f64;
        let avg_width = nodes.iter().map(LayoutNode::width_or_default).sum::<f64>() / count;
        let avg_height = nodes.iter().map(LayoutNode::height_or_default).sum::<f64>() / count;

        let sibling_mult = options.density.sibling_multiplier();
        let rank_mult = options.density.rank_multiplier();

        if options.direction.is_horizontal() {
            // Siblings stack vertically; ranks advance horizontally. The
            // left-right orientation reserves extra rank room for arrows.
            let arrow_factor = if options.direction == Direction::LeftRight {
                LEFT_RIGHT_RANK_FACTOR
            } else {
                1.0
            };
            Self {
                sibling: (avg_height + VERTICAL_PADDING) * sibling_mult,
                rank: (avg_width + HORIZONTAL_PADDING) * rank_mult * arrow_factor,
            }
        } else {
            Self {
                sibling: (avg_width + HORIZONTAL_PADDING) * sibling_mult,
                rank: (avg_height + VERTICAL_PADDING) * rank_mult,
            }
        }
    }
}

/// Extent of a node along the sibling / rank axes for the given direction.
fn axis_extents(node: &LayoutNode, direction: Direction) -> (f64, f64) {
    if direction.is_horizontal() {
        (node.height_or_default(), node.width_or_default())
    } else {
        (node.width_or_default(), node.height_or_default())
    }
}

fn place(nodes: &[LayoutNode], layers: &[Vec<usize>], options: &LayoutOptions) -> PositionMap {
    let direction = options.direction;
    let spacing = Spacing::derive(nodes, options);

    // Rank-axis centers: each layer is as thick as its thickest node.
    let layer_extents: Vec<f64> = layers
        .iter()
        .map(|layer| {
            layer
                .iter()
                .map(|&node| axis_extents(&nodes[node], direction).1)
                .fold(0.0, f64::max)
        })
        .collect();

    let mut rank_centers = Vec::with_capacity(layers.len());
    let mut cursor = 0.0;
    for (idx, extent) in layer_extents.iter().enumerate() {
        if idx > 0 {
            cursor += layer_extents[idx - 1] / 2.0 + spacing.rank + extent / 2.0;
        } else {
            cursor = extent / 2.0;
        }
        rank_centers.push(cursor);
    }

    // Sibling-axis centers: lay each layer out sequentially, then center
    // the layer on the rank axis origin.
    let mut centers: HashMap<usize, (f64, f64)> = HashMap::with_capacity(nodes.len());
    for (layer_idx, layer) in layers.iter().enumerate() {
        let mut offsets = Vec::with_capacity(layer.len());
        let mut sibling_cursor = 0.0;
        for &node in layer {
            let extent = axis_extents(&nodes[node], direction).0;
            offsets.push(sibling_cursor + extent / 2.0);
            sibling_cursor += extent + spacing.sibling;
        }
        let breadth = sibling_cursor - spacing.sibling;

        for (&node, offset) in layer.iter().zip(offsets) {
            let sibling_center = offset - breadth / 2.0;
            let rank_center = if direction.is_reversed() {
                -rank_centers[layer_idx]
            } else {
                rank_centers[layer_idx]
            };
            centers.insert(node, (sibling_center, rank_center));
        }
    }

    // Convert center-anchored to top-left-anchored and normalize to margin.
    let mut positions: Vec<(usize, Position)> = centers
        .into_iter()
        .map(|(node, (sibling, rank))| {
            let (cx, cy) = if direction.is_horizontal() {
                (rank, sibling)
            } else {
                (sibling, rank)
            };
            let position = Position {
                x: cx - nodes[node].width_or_default() / 2.0,
                y: cy - nodes[node].height_or_default() / 2.0,
            };
            (node, position)
        })
        .collect();

    let min_x = positions.iter().map(|(_, p)| p.x).fold(f64::INFINITY, f64::min);
    let min_y = positions.iter().map(|(_, p)| p.y).fold(f64::INFINITY, f64::min);
    for (_, position) in &mut positions {
        position.x += LAYOUT_MARGIN - min_x;
        position.y += LAYOUT_MARGIN - min_y;
    }

    positions
        .into_iter()
        .map(|(node, position)| (nodes[node].id, position))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
