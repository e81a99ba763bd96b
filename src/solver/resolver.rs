use itertools::Itertools;

use crate::distance::oracle::DistanceOracle;
use crate::domain::error::SweepError;
use crate::domain::types::SystemId;
use crate::graph::Graph;

/// Resolves an ordered list of required waypoint systems into the family of
/// minimum-length round trips that honors that order. The origin is
/// implicitly prepended and appended; each segment between consecutive
/// waypoints expands to every shortest path the oracle knows, and the
/// Cartesian product of segment options yields the full tours.
#[derive(Debug)]
pub struct TourResolver<'g> {
    origin: SystemId,
    oracle: DistanceOracle<'g>,
}

impl<'g> TourResolver<'g> {
    pub fn new(graph: &'g Graph, origin: SystemId, max_segment_length: u32) -> Self {
        TourResolver {
            origin,
            oracle: DistanceOracle::new(graph, max_segment_length),
        }
    }

    pub fn origin(&self) -> SystemId {
        self.origin
    }

    /// Minimum total length and every tour of that length visiting
    /// `required_order` in the given order.
    pub fn resolve(
        &mut self,
        required_order: &[SystemId],
    ) -> Result<(u32, Vec<Vec<SystemId>>), SweepError> {
        if required_order.is_empty() {
            return Ok((0, vec![vec![self.origin]]));
        }
        let mut waypoints = Vec::with_capacity(required_order.len() + 2);
        waypoints.push(self.origin);
        waypoints.extend_from_slice(required_order);
        waypoints.push(self.origin);

        let length =
            self.waypoint_length(&waypoints, u32::MAX)
                .ok_or_else(|| SweepError::NoRouteFound {
                    required: required_order.to_vec(),
                })?;
        Ok((length, self.expand_waypoints(&waypoints)))
    }

    /// Sum of per-segment hop counts for a waypoint sequence. None when a
    /// segment exceeds the oracle radius or the running sum exceeds `bound`.
    pub fn waypoint_length(&mut self, waypoints: &[SystemId], bound: u32) -> Option<u32> {
        let mut total = 0;
        for pair in waypoints.windows(2) {
            total += self.oracle.distance(pair[0], pair[1])?;
            if total > bound {
                return None;
            }
        }
        Some(total)
    }

    /// Expand a waypoint sequence into full tours: the shortest-path options
    /// for each segment, combined across segments. Each segment drops its
    /// leading system since it equals the previous segment's last.
    pub fn expand_waypoints(&mut self, waypoints: &[SystemId]) -> Vec<Vec<SystemId>> {
        let mut per_segment: Vec<Vec<Vec<SystemId>>> = vec![vec![vec![waypoints[0]]]];
        for pair in waypoints.windows(2) {
            let options: Vec<Vec<SystemId>> = self
                .oracle
                .shortest_paths(pair[0], pair[1])
                .into_iter()
                .map(|path| path[1..].to_vec())
                .collect();
            per_segment.push(options);
        }
        per_segment
            .into_iter()
            .multi_cartesian_product()
            .map(|segments| segments.concat())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn single_waypoint_out_and_back() {
        let graph = branchy_graph();
        let mut resolver = TourResolver::new(&graph, 1, 12);
        let (length, tours) = resolver.resolve(&[5]).unwrap();
        assert_eq!(length, 2);
        assert_eq!(tours, vec![vec![1, 5, 1]]);
    }

    #[test]
    fn segment_ties_multiply_into_the_tour_family() {
        let graph = branchy_graph();
        let mut resolver = TourResolver::new(&graph, 1, 12);
        let (length, tours) = resolver.resolve(&[6]).unwrap();
        assert_eq!(length, 6);
        // two options out, two options back
        assert_eq!(tours.len(), 4);
        for tour in &tours {
            assert_eq!(tour.len(), 7);
            assert_eq!(tour[0], 1);
            assert_eq!(*tour.last().unwrap(), 1);
            for pair in tour.windows(2) {
                assert!(graph.neighbors(pair[0]).contains(&pair[1]));
            }
        }
        assert!(tours.contains(&vec![1, 2, 3, 6, 3, 2, 1]));
        assert!(tours.contains(&vec![1, 2, 4, 6, 4, 2, 1]));
    }

    #[test]
    fn ordered_pair_respects_the_given_order() {
        let graph = branchy_graph();
        let mut resolver = TourResolver::new(&graph, 1, 12);
        let (length, tours) = resolver.resolve(&[3, 4]).unwrap();
        assert_eq!(length, 5);
        assert_eq!(tours, vec![vec![1, 2, 3, 4, 2, 1]]);
    }

    #[test]
    fn empty_order_is_the_trivial_tour() {
        let graph = branchy_graph();
        let mut resolver = TourResolver::new(&graph, 1, 12);
        let (length, tours) = resolver.resolve(&[]).unwrap();
        assert_eq!(length, 0);
        assert_eq!(tours, vec![vec![1]]);
    }

    #[test]
    fn unreachable_waypoint_is_no_route() {
        let edges: Vec<(u32, u32)> = (1..20).map(|i| (i, i + 1)).collect();
        let graph = Graph::from_undirected_edges(edges).unwrap();
        let mut resolver = TourResolver::new(&graph, 1, 10);
        let err = resolver.resolve(&[15]).unwrap_err();
        assert!(matches!(err, SweepError::NoRouteFound { .. }));
    }

    #[test]
    fn waypoint_length_prunes_against_the_bound() {
        let graph = branchy_graph();
        let mut resolver = TourResolver::new(&graph, 1, 12);
        assert_eq!(resolver.waypoint_length(&[1, 6, 1], 6), Some(6));
        assert_eq!(resolver.waypoint_length(&[1, 6, 1], 5), None);
    }

    #[test]
    fn brute_force_agrees_on_the_minimum_length() {
        // every tour respecting the order [3, 4] enumerated by hand on the
        // small graph: the resolver's 5 hops is the true minimum
        let graph = branchy_graph();
        let mut resolver = TourResolver::new(&graph, 1, 12);
        let (length, _) = resolver.resolve(&[3, 4]).unwrap();
        let mut best = u32::MAX;
        // depth-limited walk enumerating closed walks from 1 through 3 then 4
        fn walk(
            graph: &Graph,
            path: &mut Vec<u32>,
            best: &mut u32,
            limit: usize,
        ) {
            let last = *path.last().unwrap();
            if path.len() > 1 && last == 1 {
                let mut seen_3 = usize::MAX;
                let mut seen_4 = 0;
                for (i, &s) in path.iter().enumerate() {
                    if s == 3 && seen_3 == usize::MAX {
                        seen_3 = i;
                    }
                    if s == 4 && seen_3 != usize::MAX {
                        seen_4 = i;
                    }
                }
                if seen_3 != usize::MAX && seen_4 > seen_3 {
                    *best = (*best).min((path.len() - 1) as u32);
                }
            }
            if path.len() >= limit {
                return;
            }
            for &n in graph.neighbors(last) {
                path.push(n);
                walk(graph, path, best, limit);
                path.pop();
            }
        }
        walk(&graph, &mut vec![1], &mut best, 8);
        assert_eq!(length, best);
    }
}
