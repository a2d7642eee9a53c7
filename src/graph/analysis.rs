//! Shape Graph Analysis
//!
//! Builds a petgraph view of shape relationships and answers reachability
//! queries for the pruning transforms.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::{HashMap, HashSet};

use super::{Model, RelationshipKind, ShapeId};

/// Directed relationship graph over every shape in a model
pub struct Reachability {
    graph: DiGraph<ShapeId, RelationshipKind>,
    node_indices: HashMap<ShapeId, NodeIndex>,
}

impl Reachability {
    /// Index every shape and relationship of the model.
    ///
    /// Nodes are added in sorted ID order so traversal order is stable.
    pub fn new(model: &Model) -> Self {
        let shapes = model.sorted_shapes();
        let mut graph = DiGraph::with_capacity(shapes.len(), shapes.len() * 2);
        let mut node_indices = HashMap::with_capacity(shapes.len());

        for shape in &shapes {
            let idx = graph.add_node(shape.id().clone());
            node_indices.insert(shape.id().clone(), idx);
        }

        for shape in &shapes {
            let from = node_indices[shape.id()];
            for (kind, target) in shape.relationships() {
                if let Some(&to) = node_indices.get(&target) {
                    graph.add_edge(from, to, kind);
                }
            }
        }

        Self {
            graph,
            node_indices,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every shape reachable from the roots, roots included.
    ///
    /// Roots that are not in the model are ignored.
    pub fn reachable_from<'a>(&self, roots: impl IntoIterator<Item = &'a ShapeId>) -> HashSet<ShapeId> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();

        for root in roots {
            let Some(&start) = self.node_indices.get(root) else {
                continue;
            };
            if visited.contains(&start) {
                continue;
            }

            let mut dfs = Dfs::new(&self.graph, start);
            while let Some(idx) = dfs.next(&self.graph) {
                visited.insert(idx);
            }
        }

        visited
            .into_iter()
            .filter_map(|idx| self.graph.node_weight(idx).cloned())
            .collect()
    }
}

/// Convenience wrapper: reachable set for a single query
pub fn reachable_shapes<'a>(
    model: &Model,
    roots: impl IntoIterator<Item = &'a ShapeId>,
) -> HashSet<ShapeId> {
    Reachability::new(model).reachable_from(roots)
}
