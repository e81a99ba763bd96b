use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet};

use tracing::{debug, info, span, Level};

use crate::domain::frontier::Frontier;
use crate::domain::types::{Site, Solution, SweepConfig, SystemId, SystemSet};
use crate::graph::Graph;
use crate::inventory::InventoryIndex;
use crate::packing::pack;
use crate::priority::system_priorities;

// Floor for the best value-per-jump tracker; keeps the optimistic-bound
// arithmetic finite before the first real solution lands.
const SEED_VALUE_PER_JUMP: f64 = 0.1;

/// Candidate system waiting in the expansion queue. Max-heap order: highest
/// priority first, then shallowest discovery depth, then lowest system id.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    priority: f64,
    depth: u32,
    system: SystemId,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then(other.depth.cmp(&self.depth))
            .then(other.system.cmp(&self.system))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Partial plan tracked per visited-system set. The tour is None when the
/// optimistic bound showed the set could not beat the best known plan, or
/// when the round-trip search came back empty.
#[derive(Debug, Clone)]
struct SweepNode {
    systems: SystemSet,
    tour: Option<Vec<SystemId>>,
    load: Vec<Site>,
    total_value: f64,
    value_per_jump: f64,
}

/// Adjacency-driven sweep: grows candidate solutions one neighboring system
/// at a time, steered by the priority oracle, and resolves round trips with
/// a depth-bounded DFS over the induced subgraph.
pub struct AdjacencySweep<'g> {
    graph: &'g Graph,
    inventory: &'g InventoryIndex,
    origin: SystemId,
    config: SweepConfig,
    frontier: Frontier,
}

impl<'g> AdjacencySweep<'g> {
    pub fn new(
        graph: &'g Graph,
        inventory: &'g InventoryIndex,
        origin: SystemId,
        config: SweepConfig,
    ) -> Self {
        AdjacencySweep {
            graph,
            inventory,
            origin,
            config,
            frontier: Frontier::new(),
        }
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Run the expansion until the candidate heap drains or the solutions
    /// map hits the cap. The frontier is readable afterwards either way.
    pub fn run(&mut self) -> &Frontier {
        let run_span = span!(Level::INFO, "adjacency_sweep", origin = self.origin);
        let _guard = run_span.enter();

        let priorities = system_priorities(
            self.graph,
            self.inventory,
            self.origin,
            self.config.max_priority_distance,
            self.config.priority_decay,
        );

        let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();
        heap.push(Candidate {
            priority: priorities.get(&self.origin).copied().unwrap_or(0.0),
            depth: 0,
            system: self.origin,
        });
        let mut discovered: HashSet<SystemId> = HashSet::from([self.origin]);

        let mut best_value_per_jump = SEED_VALUE_PER_JUMP;
        let empty_baseline = SweepNode {
            systems: SystemSet::default(),
            tour: None,
            load: vec![],
            total_value: 0.0,
            value_per_jump: 0.0,
        };
        // BTreeMap keeps the replay order deterministic
        let mut solutions: BTreeMap<SystemSet, SweepNode> = BTreeMap::new();
        let seed = self.evaluate(self.origin, &empty_baseline, 1.0);
        solutions.insert(seed.systems.clone(), seed);

        while let Some(candidate) = heap.pop() {
            if solutions.len() >= self.config.solutions_cap {
                info!(
                    "solutions cap {} reached, stopping expansion",
                    self.config.solutions_cap
                );
                break;
            }
            debug!(
                "candidate {} priority {:.1}, {} solutions, {} queued",
                candidate.system,
                candidate.priority,
                solutions.len(),
                heap.len()
            );

            let neighbors = self.graph.neighbors(candidate.system);
            for &n in neighbors {
                if discovered.insert(n) {
                    heap.push(Candidate {
                        priority: priorities.get(&n).copied().unwrap_or(0.0),
                        depth: candidate.depth + 1,
                        system: n,
                    });
                }
            }

            let mut grown: BTreeMap<SystemSet, SweepNode> = BTreeMap::new();
            for (set, node) in &solutions {
                if set.contains(candidate.system) || !set.intersects(neighbors) {
                    continue;
                }
                let new_node = self.evaluate(candidate.system, node, best_value_per_jump);
                if let Some(tour) = &new_node.tour {
                    if new_node.value_per_jump > best_value_per_jump {
                        best_value_per_jump = new_node.value_per_jump;
                        info!(
                            "new best: {:.1}/jump over {} systems",
                            best_value_per_jump,
                            new_node.systems.len()
                        );
                    }
                    self.frontier
                        .update(Solution::new(tour.clone(), new_node.load.clone()));
                }
                grown.insert(new_node.systems.clone(), new_node);
            }
            solutions.extend(grown);
        }

        &self.frontier
    }

    /// Extend `baseline` with `system`, repack the load, and resolve a round
    /// trip unless the optimistic value-per-jump bound already loses to
    /// `best_value_per_jump`.
    fn evaluate(&self, system: SystemId, baseline: &SweepNode, best_value_per_jump: f64) -> SweepNode {
        let systems = baseline.systems.with(system);

        let new_sites = self.inventory.sites_in(system);
        let load = if new_sites.is_empty() {
            baseline.load.clone()
        } else {
            let mut pool = baseline.load.clone();
            pool.extend(new_sites.iter().cloned());
            pack(&pool, self.config.volume_budget)
        };
        let total_value: f64 = load.iter().map(|s| s.value).sum();

        if total_value <= 0.0 {
            return SweepNode {
                systems,
                tour: None,
                load,
                total_value,
                value_per_jump: 0.0,
            };
        }

        // systems the tour must pass through: everywhere a loaded site
        // lives, plus the origin
        let required = SystemSet::from_systems(
            load.iter()
                .map(|s| s.system_id)
                .chain(std::iter::once(self.origin)),
        );

        // an ideal round trip closes in |required| hops; if even that loses,
        // skip the expensive search
        let optimistic = total_value / (required.len() + load.len()) as f64;
        if optimistic <= best_value_per_jump {
            return SweepNode {
                systems,
                tour: None,
                load,
                total_value,
                value_per_jump: optimistic,
            };
        }

        let max_hops =
            ((total_value / best_value_per_jump) as usize).saturating_sub(load.len());
        let tour = self.shortest_roundtrip(&systems, &required, max_hops + 1);
        let value_per_jump = match &tour {
            Some(tour) => total_value / ((tour.len() - 1) + load.len()) as f64,
            // nothing closed within the cap; score as if one hop past it
            None => total_value / (max_hops + 1 + load.len()) as f64,
        };
        SweepNode {
            systems,
            tour,
            load,
            total_value,
            value_per_jump,
        }
    }

    /// Shortest round trip from the origin that stays inside `included` and
    /// visits every system in `required`, or None if nothing closes within
    /// `max_nodes` path entries.
    fn shortest_roundtrip(
        &self,
        included: &SystemSet,
        required: &SystemSet,
        max_nodes: usize,
    ) -> Option<Vec<SystemId>> {
        let induced: HashMap<SystemId, Vec<SystemId>> = included
            .iter()
            .map(|s| {
                let kept: Vec<SystemId> = self
                    .graph
                    .neighbors(s)
                    .iter()
                    .copied()
                    .filter(|n| included.contains(*n))
                    .collect();
                (s, kept)
            })
            .collect();

        let mut remaining: BTreeSet<SystemId> =
            required.iter().filter(|&s| s != self.origin).collect();
        let mut path = vec![self.origin];
        let mut visits: HashMap<SystemId, usize> = HashMap::new();
        search_path(&induced, &mut path, &mut remaining, max_nodes, &mut visits)
    }
}

// Depth-first search for the shortest closed walk. The visit counter prunes
// re-entry into a node already visited as often as its induced degree; once
// a walk closes, its length minus one becomes the new node budget so only
// strictly shorter siblings are explored.
fn search_path(
    induced: &HashMap<SystemId, Vec<SystemId>>,
    path: &mut Vec<SystemId>,
    remaining: &mut BTreeSet<SystemId>,
    mut max_nodes: usize,
    visits: &mut HashMap<SystemId, usize>,
) -> Option<Vec<SystemId>> {
    if path.len() + remaining.len() > max_nodes {
        return None;
    }
    let current = *path.last().expect("path never empty");
    if current == path[0] && remaining.is_empty() && path.len() > 1 {
        return Some(path.clone());
    }

    // least-visited first, id as tiebreak, for the lexicographically
    // smallest of equal-length walks
    let mut adjacent = induced[&current].clone();
    adjacent.sort_by_key(|n| (visits.get(n).copied().unwrap_or(0), *n));

    let mut best: Option<Vec<SystemId>> = None;
    for n in adjacent {
        let degree = induced[&n].len();
        if visits.get(&n).copied().unwrap_or(0) >= degree {
            continue;
        }
        *visits.entry(n).or_insert(0) += 1;
        path.push(n);
        let newly_covered = remaining.remove(&n);
        if let Some(found) = search_path(induced, path, remaining, max_nodes, visits) {
            max_nodes = found.len() - 1;
            best = Some(found);
        }
        if newly_covered {
            remaining.insert(n);
        }
        path.pop();
        *visits.get_mut(&n).expect("visit count present") -= 1;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn site(site_id: u64, system_id: u32, value: f64, volume: f64) -> Site {
        Site {
            site_id,
            system_id,
            value,
            volume,
        }
    }

    fn config(volume_budget: f64) -> SweepConfig {
        SweepConfig::new(volume_budget, Duration::from_secs(5))
    }

    fn roundtrip(
        graph: &Graph,
        origin: u32,
        included: &[u32],
        required: &[u32],
        max_nodes: usize,
    ) -> Option<Vec<u32>> {
        let inventory = InventoryIndex::build(vec![], 999, graph).unwrap();
        let sweep = AdjacencySweep::new(graph, &inventory, origin, config(100.0));
        sweep.shortest_roundtrip(
            &SystemSet::from_systems(included.iter().copied()),
            &SystemSet::from_systems(required.iter().copied()),
            max_nodes,
        )
    }

    #[test]
    fn dfs_covers_every_required_system() {
        //     1 - 2 - 3
        //          \ /
        //           4   plus a spur 1 - 5
        let graph =
            Graph::from_undirected_edges([(1, 2), (2, 3), (2, 4), (3, 4), (1, 5)]).unwrap();
        // the spur forces a detour through 1, so the walk re-enters the
        // origin mid-tour: 8 entries, 7 hops
        let tour = roundtrip(&graph, 1, &[1, 2, 3, 4, 5], &[1, 2, 3, 4, 5], 100).unwrap();
        assert_eq!(tour.len(), 8);
        assert_eq!(tour[0], 1);
        assert_eq!(*tour.last().unwrap(), 1);
        let covered = SystemSet::from_systems(tour.iter().copied());
        assert_eq!(covered.len(), 5);
        for pair in tour.windows(2) {
            assert!(graph.neighbors(pair[0]).contains(&pair[1]));
        }
    }

    #[test]
    fn dfs_respects_the_node_budget() {
        let graph = Graph::from_undirected_edges([(1, 2), (2, 3), (3, 4)]).unwrap();
        // reaching 4 and returning needs 7 path entries
        assert!(roundtrip(&graph, 1, &[1, 2, 3, 4], &[4], 7).is_some());
        assert!(roundtrip(&graph, 1, &[1, 2, 3, 4], &[4], 6).is_none());
    }

    #[test]
    fn dfs_prefers_the_lexicographically_smaller_tie() {
        // two equal-length loops around the square 1-2-4-3-1
        let graph = Graph::from_undirected_edges([(1, 2), (2, 4), (4, 3), (3, 1)]).unwrap();
        let tour = roundtrip(&graph, 1, &[1, 2, 3, 4], &[4], 100).unwrap();
        assert_eq!(tour, vec![1, 2, 4, 3, 1]);
    }

    #[test]
    fn straight_line_pickup() {
        // S1: line 1-2-3-4, one site at 3
        let graph = Graph::from_undirected_edges([(1, 2), (2, 3), (3, 4)]).unwrap();
        let inventory =
            InventoryIndex::build(vec![site(10, 3, 100.0, 10.0)], 999, &graph).unwrap();
        let mut sweep = AdjacencySweep::new(&graph, &inventory, 1, config(50.0));
        let frontier = sweep.run();
        let best = frontier.best_by_value_per_jump().unwrap();
        assert_eq!(best.tour, vec![1, 2, 3, 2, 1]);
        assert_eq!(best.load.len(), 1);
        assert_eq!(best.load[0].site_id, 10);
        assert_eq!(best.jump_count, 5);
        assert_eq!(best.value_per_jump, 20.0);
    }

    #[test]
    fn branch_choice_favors_the_valuable_spur() {
        // S2: star around 1; the engine should single out the 100-value spur
        let graph = Graph::from_undirected_edges([(1, 2), (1, 3), (1, 4)]).unwrap();
        let inventory = InventoryIndex::build(
            vec![
                site(20, 2, 10.0, 5.0),
                site(30, 3, 100.0, 5.0),
                site(40, 4, 20.0, 5.0),
            ],
            999,
            &graph,
        )
        .unwrap();
        let mut sweep = AdjacencySweep::new(&graph, &inventory, 1, config(100.0));
        let frontier = sweep.run();
        let best = frontier.best_by_value_per_jump().unwrap();
        assert_eq!(best.tour, vec![1, 3, 1]);
        assert_eq!(best.jump_count, 3);
        assert_eq!(best.total_value, 100.0);
    }

    #[test]
    fn frontier_solutions_are_structurally_valid() {
        let graph =
            Graph::from_undirected_edges([(1, 2), (2, 3), (3, 1), (3, 4)]).unwrap();
        let inventory = InventoryIndex::build(
            vec![
                site(20, 2, 50.0, 10.0),
                site(30, 3, 50.0, 10.0),
                site(40, 4, 75.0, 30.0),
            ],
            999,
            &graph,
        )
        .unwrap();
        let mut sweep = AdjacencySweep::new(&graph, &inventory, 1, config(40.0));
        let frontier = sweep.run();
        assert!(!frontier.is_empty());
        for (jump_count, solution) in frontier.iter() {
            assert_eq!(solution.tour[0], 1);
            assert_eq!(*solution.tour.last().unwrap(), 1);
            for pair in solution.tour.windows(2) {
                assert!(graph.neighbors(pair[0]).contains(&pair[1]));
            }
            assert!(solution.total_volume <= 40.0);
            assert_eq!(
                jump_count,
                solution.tour.len() - 1 + solution.load.len()
            );
            let mut ids: Vec<u64> = solution.load.iter().map(|s| s.site_id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), solution.load.len());
        }
    }

    #[test]
    fn solutions_cap_stops_the_expansion() {
        let edges: Vec<(u32, u32)> = (1..12).map(|i| (i, i + 1)).collect();
        let graph = Graph::from_undirected_edges(edges).unwrap();
        let sites: Vec<Site> = (2..=12).map(|s| site(s as u64, s, 10.0, 1.0)).collect();
        let inventory = InventoryIndex::build(sites, 999, &graph).unwrap();
        let mut cfg = config(100.0);
        cfg.solutions_cap = 3;
        let mut sweep = AdjacencySweep::new(&graph, &inventory, 1, cfg);
        let frontier = sweep.run();
        // capped early, but whatever was found stays readable
        assert!(frontier.len() <= 3);
    }
}
