use std::collections::HashMap;

use tracing::trace;

use crate::domain::types::SystemId;
use crate::graph::Graph;

/// Lazy, cached hop-count oracle.
///
/// The first query from a source runs a breadth-first expansion truncated at
/// `max_segment_length` and memoizes the whole layer map; every later query
/// involving that source is a lookup. Because the graph is symmetric, a map
/// built from `a` also answers queries phrased as `(b, a)`. A missing entry
/// means the hop count exceeds the radius; callers treat that as infinity.
#[derive(Debug)]
pub struct DistanceOracle<'g> {
    graph: &'g Graph,
    max_segment_length: u32,
    maps: HashMap<SystemId, HashMap<SystemId, u32>>,
}

impl<'g> DistanceOracle<'g> {
    pub fn new(graph: &'g Graph, max_segment_length: u32) -> Self {
        DistanceOracle {
            graph,
            max_segment_length,
            maps: HashMap::new(),
        }
    }

    /// Shortest-path hop count, or None beyond the segment radius.
    pub fn distance(&mut self, a: SystemId, b: SystemId) -> Option<u32> {
        if self.maps.contains_key(&a) {
            return self.maps[&a].get(&b).copied();
        }
        if self.maps.contains_key(&b) {
            return self.maps[&b].get(&a).copied();
        }
        let map = self.build_distance_map(a);
        let answer = map.get(&b).copied();
        self.maps.insert(a, map);
        answer
    }

    /// All equal-length shortest paths from `a` to `b`. Empty when `b` is
    /// beyond the radius. Path order follows sorted neighbor iteration but
    /// callers must not depend on it.
    pub fn shortest_paths(&mut self, a: SystemId, b: SystemId) -> Vec<Vec<SystemId>> {
        match self.distance(a, b) {
            None => vec![],
            Some(0) => vec![vec![a]],
            Some(1) => vec![vec![a, b]],
            Some(d) => {
                let mut paths = vec![];
                for n in self.graph.neighbors(a).to_vec() {
                    if self.distance(n, b) == Some(d - 1) {
                        for tail in self.shortest_paths(n, b) {
                            let mut path = Vec::with_capacity(tail.len() + 1);
                            path.push(a);
                            path.extend(tail);
                            paths.push(path);
                        }
                    }
                }
                paths
            }
        }
    }

    // Layered BFS from `source`, stopping once the layer depth would exceed
    // the segment radius.
    fn build_distance_map(&self, source: SystemId) -> HashMap<SystemId, u32> {
        trace!("building distance map from system {source}");
        let mut distances: HashMap<SystemId, u32> = HashMap::from([(source, 0)]);
        let mut layer: Vec<SystemId> = vec![source];
        let mut depth = 1;
        while !layer.is_empty() && depth <= self.max_segment_length {
            let mut next_layer: Vec<SystemId> = vec![];
            for &system in &layer {
                for &n in self.graph.neighbors(system) {
                    if !distances.contains_key(&n) {
                        distances.insert(n, depth);
                        next_layer.push(n);
                    }
                }
            }
            layer = next_layer;
            depth += 1;
        }
        distances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    //         1
    //        / \
    //       2   5
    //      / \
    //     3 - 4
    //      \ /
    //       6
    fn branchy_graph() -> Graph {
        Graph::from_undirected_edges([(1, 2), (1, 5), (2, 3), (2, 4), (3, 4), (3, 6), (4, 6)])
            .unwrap()
    }

    #[test]
    fn distances_across_the_graph() {
        let graph = branchy_graph();
        let mut oracle = DistanceOracle::new(&graph, 12);
        assert_eq!(oracle.distance(1, 5), Some(1));
        assert_eq!(oracle.distance(4, 1), Some(2));
        assert_eq!(oracle.distance(5, 3), Some(3));
        assert_eq!(oracle.distance(5, 6), Some(4));
        assert_eq!(oracle.distance(1, 1), Some(0));
    }

    #[test]
    fn distance_is_symmetric() {
        let graph = branchy_graph();
        let mut oracle = DistanceOracle::new(&graph, 12);
        for a in 1..=6 {
            for b in 1..=6 {
                assert_eq!(oracle.distance(a, b), oracle.distance(b, a));
            }
        }
    }

    #[test]
    fn triangle_inequality_holds() {
        let graph = branchy_graph();
        let mut oracle = DistanceOracle::new(&graph, 12);
        for a in 1..=6 {
            for b in 1..=6 {
                for c in 1..=6 {
                    let (ab, bc, ac) = (
                        oracle.distance(a, b).unwrap(),
                        oracle.distance(b, c).unwrap(),
                        oracle.distance(a, c).unwrap(),
                    );
                    assert!(ac <= ab + bc);
                }
            }
        }
    }

    #[test]
    fn radius_truncates_the_map() {
        let edges: Vec<(u32, u32)> = (1..20).map(|i| (i, i + 1)).collect();
        let graph = Graph::from_undirected_edges(edges).unwrap();
        let mut oracle = DistanceOracle::new(&graph, 10);
        assert_eq!(oracle.distance(1, 11), Some(10));
        assert_eq!(oracle.distance(1, 15), None);
        assert_eq!(oracle.distance(1, 20), None);
    }

    #[test]
    fn shortest_paths_enumerates_every_tie() {
        let graph = branchy_graph();
        let mut oracle = DistanceOracle::new(&graph, 12);
        assert_eq!(oracle.shortest_paths(1, 4), vec![vec![1, 2, 4]]);
        assert_eq!(
            oracle.shortest_paths(1, 6),
            vec![vec![1, 2, 3, 6], vec![1, 2, 4, 6]]
        );
        assert_eq!(oracle.shortest_paths(3, 3), vec![vec![3]]);
    }

    #[test]
    fn shortest_paths_have_consistent_length_and_adjacency() {
        let graph = branchy_graph();
        let mut oracle = DistanceOracle::new(&graph, 12);
        for a in 1..=6 {
            for b in 1..=6 {
                let d = oracle.distance(a, b).unwrap() as usize;
                for path in oracle.shortest_paths(a, b) {
                    assert_eq!(path.len(), d + 1);
                    assert_eq!(path[0], a);
                    assert_eq!(*path.last().unwrap(), b);
                    for pair in path.windows(2) {
                        assert!(graph.neighbors(pair[0]).contains(&pair[1]));
                    }
                }
            }
        }
    }

    #[test]
    fn unreachable_pair_yields_no_paths() {
        let graph = Graph::from_undirected_edges([(1, 2), (8, 9)]).unwrap();
        let mut oracle = DistanceOracle::new(&graph, 12);
        assert_eq!(oracle.distance(1, 9), None);
        assert!(oracle.shortest_paths(1, 9).is_empty());
    }
}
