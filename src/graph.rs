use std::collections::HashMap;

use crate::domain::error::SweepError;
use crate::domain::types::SystemId;

/// Immutable adjacency over star systems. Neighbor lists are kept sorted so
/// every traversal in the planner iterates in a reproducible order.
#[derive(Debug, Clone)]
pub struct Graph {
    adjacency: HashMap<SystemId, Vec<SystemId>>,
}

impl Graph {
    /// Build from undirected edges; both directions are inserted.
    pub fn from_undirected_edges(
        edges: impl IntoIterator<Item = (SystemId, SystemId)>,
    ) -> Result<Self, SweepError> {
        let mut adjacency: HashMap<SystemId, Vec<SystemId>> = HashMap::new();
        for (a, b) in edges {
            if a == b {
                return Err(SweepError::InvalidGraph {
                    reason: format!("self-loop on system {a}"),
                });
            }
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
        }
        for neighbors in adjacency.values_mut() {
            neighbors.sort_unstable();
            neighbors.dedup();
        }
        Ok(Graph { adjacency })
    }

    /// Build from directed rows (one per travel direction, as stored in the
    /// static data dump) and verify every edge has its reverse.
    pub fn from_directed_rows(
        rows: impl IntoIterator<Item = (SystemId, SystemId)>,
    ) -> Result<Self, SweepError> {
        let mut adjacency: HashMap<SystemId, Vec<SystemId>> = HashMap::new();
        for (from, to) in rows {
            if from == to {
                return Err(SweepError::InvalidGraph {
                    reason: format!("self-loop on system {from}"),
                });
            }
            adjacency.entry(from).or_default().push(to);
        }
        for neighbors in adjacency.values_mut() {
            neighbors.sort_unstable();
            neighbors.dedup();
        }
        let graph = Graph { adjacency };
        graph.check_symmetry()?;
        Ok(graph)
    }

    fn check_symmetry(&self) -> Result<(), SweepError> {
        for (&system, neighbors) in &self.adjacency {
            for &n in neighbors {
                if !self.neighbors(n).contains(&system) {
                    return Err(SweepError::InvalidGraph {
                        reason: format!("edge {system} -> {n} has no reverse"),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn contains(&self, system_id: SystemId) -> bool {
        self.adjacency.contains_key(&system_id)
    }

    /// Sorted neighbors of `system_id`; empty for unknown systems.
    pub fn neighbors(&self, system_id: SystemId) -> &[SystemId] {
        self.adjacency
            .get(&system_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}
