//! Layout orchestration: pinned partitioning, engine dispatch, fallback.
//!
//! The service guarantees two things to callers no matter what an engine
//! does: pinned node coordinates are returned exactly as stored, and the
//! result always contains a position for every input node. Engine failures
//! are absorbed into the grid fallback: layout must never block
//! conversation usage.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

use crate::layout::{
    GridLayoutEngine, LayoutEdge, LayoutEngine, LayoutNode, LayoutOptions, Position, PositionMap,
    RankLayoutEngine,
};

// ---------------------------------------------------------------------------
// Performance targets
// ---------------------------------------------------------------------------

/// Advisory target for trees under 50 nodes (milliseconds).
pub const SMALL_TREE_TARGET_MS: f64 = 50.0;

/// Advisory target for trees under 100 nodes.
pub const MEDIUM_TREE_TARGET_MS: f64 = 100.0;

/// Advisory target for everything larger.
pub const LARGE_TREE_TARGET_MS: f64 = 500.0;

fn performance_target_ms(node_count: usize) -> f64 {
    if node_count < 50 {
        SMALL_TREE_TARGET_MS
    } else if node_count < 100 {
        MEDIUM_TREE_TARGET_MS
    } else {
        LARGE_TREE_TARGET_MS
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Diagnostics attached to every layout result.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutMetadata {
    pub node_count: usize,
    pub pinned_count: usize,
    pub unpinned_count: usize,
    pub calculation_time_ms: f64,
    /// Name of the engine that produced the positions.
    pub engine: String,
}

/// Outcome of a layout request. `positions` is always complete, even when
/// `success` is `false` and the fallback produced the coordinates.
#[derive(Debug, Clone)]
pub struct LayoutOutcome {
    pub positions: PositionMap,
    pub success: bool,
    pub error: Option<String>,
    pub metadata: LayoutMetadata,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

type EngineFactory = Box<dyn Fn() -> Box<dyn LayoutEngine> + Send + Sync>;

/// Name of the default engine.
pub const DEFAULT_ENGINE: &str = "rank";

/// Orchestrates layout requests over a registry of interchangeable engines.
pub struct LayoutService {
    engines: BTreeMap<&'static str, EngineFactory>,
    engine: Box<dyn LayoutEngine>,
}

impl Default for LayoutService {
    fn default() -> Self {
        Self::new(DEFAULT_ENGINE)
    }
}

impl LayoutService {
    /// Create a service with the built-in engines registered and `engine`
    /// selected. Unknown names fall back to the default (logged).
    pub fn new(engine: &str) -> Self {
        let mut service = Self {
            engines: BTreeMap::new(),
            engine: Box::new(RankLayoutEngine),
        };
        service.register_engine(DEFAULT_ENGINE, Box::new(|| Box::new(RankLayoutEngine)));
        service.register_engine("grid", Box::new(|| Box::new(GridLayoutEngine)));
        service.set_engine(engine);
        service
    }

    /// Register an engine constructor under `name`, replacing any previous
    /// registration.
    pub fn register_engine(&mut self, name: &'static str, factory: EngineFactory) {
        self.engines.insert(name, factory);
    }

    /// Select the active engine by registry name. Unknown names log a
    /// warning and select the default instead.
    pub fn set_engine(&mut self, name: &str) {
        let resolved = if self.engines.contains_key(name) {
            name
        } else {
            tracing::warn!(engine = name, "Unknown layout engine, using default");
            DEFAULT_ENGINE
        };
        let factory = self
            .engines
            .get(resolved)
            .expect("default engine is always registered");
        self.engine = factory();
    }

    /// Registered engine names, sorted.
    pub fn available_engines(&self) -> Vec<&'static str> {
        self.engines.keys().copied().collect()
    }

    /// Name of the currently selected engine.
    pub fn current_engine(&self) -> &'static str {
        self.engine.name()
    }

    /// Compute positions for `nodes`.
    ///
    /// Pinned nodes keep their stored coordinates verbatim and are excluded
    /// from engine input; when every node is pinned (or the input is empty)
    /// no engine runs at all. Engine failures are downgraded to the grid
    /// fallback with `success = false`.
    pub fn calculate_layout(
        &self,
        nodes: &[LayoutNode],
        edges: &[LayoutEdge],
        options: &LayoutOptions,
    ) -> LayoutOutcome {
        let start = Instant::now();

        let (pinned, unpinned): (Vec<LayoutNode>, Vec<LayoutNode>) =
            nodes.iter().copied().partition(|n| n.is_pinned);

        let pinned_positions: Vec<(crate::types::NodeId, Position)> = pinned
            .iter()
            .map(|n| (n.id, Position { x: n.x, y: n.y }))
            .collect();

        // Nothing to recompute: hand back the stored coordinates without
        // ever invoking an engine.
        if unpinned.is_empty() {
            return LayoutOutcome {
                positions: pinned_positions.into_iter().collect(),
                success: true,
                error: None,
                metadata: self.metadata(nodes.len(), pinned.len(), start),
            };
        }

        let unpinned_edges: Vec<LayoutEdge> = {
            let unpinned_ids: std::collections::HashSet<_> =
                unpinned.iter().map(|n| n.id).collect();
            edges
                .iter()
                .filter(|e| unpinned_ids.contains(&e.source) && unpinned_ids.contains(&e.target))
                .copied()
                .collect()
        };

        match self.engine.calculate(&unpinned, &unpinned_edges, options) {
            Ok(mut positions) => {
                // Pinned entries win over anything the engine emitted.
                positions.extend(pinned_positions);

                let metadata = self.metadata(nodes.len(), pinned.len(), start);
                self.check_performance(&metadata);
                LayoutOutcome {
                    positions,
                    success: true,
                    error: None,
                    metadata,
                }
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    engine = self.engine.name(),
                    node_count = nodes.len(),
                    "Layout engine failed, substituting grid fallback"
                );

                let mut positions = GridLayoutEngine::place(&unpinned);
                positions.extend(pinned_positions);

                let mut metadata = self.metadata(nodes.len(), pinned.len(), start);
                metadata.engine = "grid".to_string();
                LayoutOutcome {
                    positions,
                    success: false,
                    error: Some(err.to_string()),
                    metadata,
                }
            }
        }
    }

    fn metadata(&self, node_count: usize, pinned_count: usize, start: Instant) -> LayoutMetadata {
        LayoutMetadata {
            node_count,
            pinned_count,
            unpinned_count: node_count - pinned_count,
            calculation_time_ms: start.elapsed().as_secs_f64() * 1000.0,
            engine: self.engine.name().to_string(),
        }
    }

    /// Advisory only: overshooting a target logs a warning and nothing else.
    fn check_performance(&self, metadata: &LayoutMetadata) {
        let target_ms = performance_target_ms(metadata.node_count);
        if metadata.calculation_time_ms > target_ms {
            tracing::warn!(
                node_count = metadata.node_count,
                elapsed_ms = metadata.calculation_time_ms,
                target_ms,
                "Layout calculation exceeded its advisory target"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    fn node(pinned: bool, x: f64, y: f64) -> LayoutNode {
        LayoutNode {
            id: Uuid::new_v4(),
            x,
            y,
            width: None,
            height: None,
            is_pinned: pinned,
        }
    }

    /// Engine that counts invocations and yields a fixed position.
    struct SpyEngine {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl LayoutEngine for SpyEngine {
        fn name(&self) -> &'static str {
            "spy"
        }

        fn calculate(
            &self,
            nodes: &[LayoutNode],
            _edges: &[LayoutEdge],
            _options: &LayoutOptions,
        ) -> Result<PositionMap, LayoutError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LayoutError::Engine("spy exploded".to_string()));
            }
            Ok(nodes
                .iter()
                .map(|n| (n.id, Position { x: 1.0, y: 2.0 }))
                .collect())
        }
    }

    fn service_with_spy(fail: bool) -> (LayoutService, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let captured = Arc::clone(&calls);
        let mut service = LayoutService::default();
        service.register_engine(
            "spy",
            Box::new(move || {
                Box::new(SpyEngine {
                    calls: Arc::clone(&captured),
                    fail,
                })
            }),
        );
        service.set_engine("spy");
        (service, calls)
    }

    // -- Short circuits ------------------------------------------------------

    #[test]
    fn empty_input_never_invokes_engine() {
        let (service, calls) = service_with_spy(false);
        let outcome = service.calculate_layout(&[], &[], &LayoutOptions::default());

        assert!(outcome.success);
        assert!(outcome.positions.is_empty());
        assert_eq!(outcome.metadata.node_count, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn all_pinned_never_invokes_engine_and_returns_stored_positions() {
        let (service, calls) = service_with_spy(false);
        let a = node(true, 10.5, -3.25);
        let b = node(true, 700.0, 42.0);

        let outcome = service.calculate_layout(&[a, b], &[], &LayoutOptions::default());

        assert!(outcome.success);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.positions[&a.id], Position { x: 10.5, y: -3.25 });
        assert_eq!(outcome.positions[&b.id], Position { x: 700.0, y: 42.0 });
        assert_eq!(outcome.metadata.pinned_count, 2);
        assert_eq!(outcome.metadata.unpinned_count, 0);
    }

    // -- Pinned merge discipline ---------------------------------------------

    #[test]
    fn pinned_positions_survive_engine_output() {
        let (service, _) = service_with_spy(false);
        let pinned = node(true, 123.0, 456.0);
        let free = node(false, 0.0, 0.0);

        let outcome =
            service.calculate_layout(&[pinned, free], &[], &LayoutOptions::default());

        // The spy emits (1, 2) for everything it sees; the pinned node must
        // keep its stored coordinates bit for bit.
        assert_eq!(outcome.positions[&pinned.id], Position { x: 123.0, y: 456.0 });
        assert_eq!(outcome.positions[&free.id], Position { x: 1.0, y: 2.0 });
    }

    #[test]
    fn engine_receives_only_unpinned_nodes_and_edges() {
        struct CapturingEngine {
            seen_nodes: Arc<AtomicUsize>,
            seen_edges: Arc<AtomicUsize>,
        }
        impl LayoutEngine for CapturingEngine {
            fn name(&self) -> &'static str {
                "capturing"
            }
            fn calculate(
                &self,
                nodes: &[LayoutNode],
                edges: &[LayoutEdge],
                _options: &LayoutOptions,
            ) -> Result<PositionMap, LayoutError> {
                self.seen_nodes.store(nodes.len(), Ordering::SeqCst);
                self.seen_edges.store(edges.len(), Ordering::SeqCst);
                Ok(nodes
                    .iter()
                    .map(|n| (n.id, Position { x: 0.0, y: 0.0 }))
                    .collect())
            }
        }

        let seen_nodes = Arc::new(AtomicUsize::new(0));
        let seen_edges = Arc::new(AtomicUsize::new(0));
        let nodes_captured = Arc::clone(&seen_nodes);
        let edges_captured = Arc::clone(&seen_edges);

        let mut service = LayoutService::default();
        service.register_engine(
            "capturing",
            Box::new(move || {
                Box::new(CapturingEngine {
                    seen_nodes: Arc::clone(&nodes_captured),
                    seen_edges: Arc::clone(&edges_captured),
                })
            }),
        );
        service.set_engine("capturing");

        let pinned = node(true, 0.0, 0.0);
        let free_a = node(false, 0.0, 0.0);
        let free_b = node(false, 0.0, 0.0);
        let edges = vec![
            // Touches a pinned endpoint: filtered out.
            LayoutEdge { source: pinned.id, target: free_a.id },
            // Fully unpinned: passed through.
            LayoutEdge { source: free_a.id, target: free_b.id },
        ];

        service.calculate_layout(&[pinned, free_a, free_b], &edges, &LayoutOptions::default());

        assert_eq!(seen_nodes.load(Ordering::SeqCst), 2);
        assert_eq!(seen_edges.load(Ordering::SeqCst), 1);
    }

    // -- Fallback ------------------------------------------------------------

    #[test]
    fn engine_failure_falls_back_to_grid_with_complete_positions() {
        let (service, calls) = service_with_spy(true);
        let pinned = node(true, 9.0, 9.0);
        let free_a = node(false, 0.0, 0.0);
        let free_b = node(false, 0.0, 0.0);

        let outcome =
            service.calculate_layout(&[pinned, free_a, free_b], &[], &LayoutOptions::default());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("spy exploded"));
        assert_eq!(outcome.metadata.engine, "grid");

        // Every node still has a position; the pinned one is untouched.
        assert_eq!(outcome.positions.len(), 3);
        assert_eq!(outcome.positions[&pinned.id], Position { x: 9.0, y: 9.0 });
        assert_eq!(outcome.positions[&free_a.id], Position { x: 0.0, y: 0.0 });
        assert_eq!(outcome.positions[&free_b.id], Position { x: 290.0, y: 0.0 });
    }

    #[test]
    fn cycle_from_default_engine_is_absorbed() {
        let service = LayoutService::default();
        let a = node(false, 0.0, 0.0);
        let b = node(false, 0.0, 0.0);
        let edges = vec![
            LayoutEdge { source: a.id, target: b.id },
            LayoutEdge { source: b.id, target: a.id },
        ];

        let outcome = service.calculate_layout(&[a, b], &edges, &LayoutOptions::default());

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        assert_eq!(outcome.positions.len(), 2);
    }

    // -- Registry ------------------------------------------------------------

    #[test]
    fn unknown_engine_name_falls_back_to_default() {
        let mut service = LayoutService::default();
        service.set_engine("does-not-exist");
        assert_eq!(service.current_engine(), DEFAULT_ENGINE);
    }

    #[test]
    fn built_in_engines_are_registered() {
        let service = LayoutService::default();
        assert_eq!(service.available_engines(), vec!["grid", "rank"]);
    }

    #[test]
    fn construction_with_grid_selects_grid() {
        let service = LayoutService::new("grid");
        assert_eq!(service.current_engine(), "grid");
    }

    // -- End to end with the default engine ----------------------------------

    #[test]
    fn default_engine_handles_a_small_tree() {
        let service = LayoutService::default();
        let root = node(false, 0.0, 0.0);
        let child = node(false, 0.0, 0.0);
        let edges = vec![LayoutEdge {
            source: root.id,
            target: child.id,
        }];

        let outcome = service.calculate_layout(&[root, child], &edges, &LayoutOptions::default());

        assert!(outcome.success);
        assert_eq!(outcome.metadata.engine, "rank");
        assert_eq!(outcome.metadata.node_count, 2);
        assert_eq!(outcome.metadata.unpinned_count, 2);
        assert!(outcome.positions[&child.id].y > outcome.positions[&root.id].y);
    }

    #[test]
    fn identical_requests_yield_identical_outcomes() {
        let service = LayoutService::default();
        let nodes: Vec<LayoutNode> = (0..6).map(|_| node(false, 0.0, 0.0)).collect();
        let edges: Vec<LayoutEdge> = nodes
            .windows(2)
            .map(|pair| LayoutEdge {
                source: pair[0].id,
                target: pair[1].id,
            })
            .collect();

        let first = service.calculate_layout(&nodes, &edges, &LayoutOptions::default());
        let second = service.calculate_layout(&nodes, &edges, &LayoutOptions::default());
        assert_eq!(first.positions, second.positions);
    }
}
