use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::debug;

use crate::domain::types::SystemId;
use crate::graph::Graph;
use crate::inventory::InventoryIndex;

/// Desirability score per system, used to order the adjacency engine's
/// candidate queue.
///
/// A breadth-first pass from the origin seeds every system within
/// `max_distance` with its best local site value (the origin itself seeds at
/// zero). A relaxation sweep then spills value into neighbors with
/// exponential decay until nothing changes, so systems *near* a rich system
/// still rank above empty space.
pub fn system_priorities(
    graph: &Graph,
    inventory: &InventoryIndex,
    origin: SystemId,
    max_distance: u32,
    decay: f64,
) -> HashMap<SystemId, f64> {
    // (distance from origin, current value)
    let mut seeded: HashMap<SystemId, (u32, f64)> = HashMap::from([(origin, (0, 0.0))]);
    let mut queue: VecDeque<SystemId> = VecDeque::from([origin]);
    while let Some(system) = queue.pop_front() {
        let distance = seeded[&system].0;
        for &n in graph.neighbors(system) {
            if seeded.contains_key(&n) {
                continue;
            }
            let n_distance = distance + 1;
            seeded.insert(n, (n_distance, inventory.best_value_in(n)));
            if n_distance < max_distance {
                queue.push_back(n);
            }
        }
    }

    // Spill value outward until equilibrium; values are bounded and only
    // ever raised, so this terminates.
    let mut dirty: BTreeSet<SystemId> = seeded.keys().copied().collect();
    while let Some(system) = dirty.pop_first() {
        let value = seeded[&system].1;
        for &n in graph.neighbors(system) {
            let Some(&(n_distance, n_value)) = seeded.get(&n) else {
                continue;
            };
            if value * decay > n_value {
                seeded.insert(n, (n_distance, value * decay));
                dirty.insert(n);
            }
        }
    }

    debug!("prioritized {} systems around origin {origin}", seeded.len());
    seeded.into_iter().map(|(s, (_, v))| (s, v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Site;

    fn site(site_id: u64, system_id: u32, value: f64) -> Site {
        Site {
            site_id,
            system_id,
            value,
            volume: 1.0,
        }
    }

    #[test]
    fn value_decays_back_toward_the_origin() {
        let graph = Graph::from_undirected_edges([(1, 2), (2, 3)]).unwrap();
        let inventory =
            InventoryIndex::build(vec![site(30, 3, 1000.0)], 999, &graph).unwrap();
        let priorities = system_priorities(&graph, &inventory, 1, 5, 0.5);
        assert_eq!(priorities[&3], 1000.0);
        assert_eq!(priorities[&2], 500.0);
        assert_eq!(priorities[&1], 250.0);
    }

    #[test]
    fn local_value_wins_over_spillover() {
        let graph = Graph::from_undirected_edges([(1, 2), (2, 3)]).unwrap();
        let inventory = InventoryIndex::build(
            vec![site(30, 3, 100.0), site(20, 2, 900.0)],
            999,
            &graph,
        )
        .unwrap();
        let priorities = system_priorities(&graph, &inventory, 1, 5, 0.5);
        assert_eq!(priorities[&2], 900.0);
        // spillover from 2 beats the local 100
        assert_eq!(priorities[&3], 450.0);
    }

    #[test]
    fn seeding_stops_at_the_distance_cap() {
        let edges: Vec<(u32, u32)> = (1..10).map(|i| (i, i + 1)).collect();
        let graph = Graph::from_undirected_edges(edges).unwrap();
        let inventory = InventoryIndex::build(vec![], 999, &graph).unwrap();
        let priorities = system_priorities(&graph, &inventory, 1, 3, 0.5);
        assert!(priorities.contains_key(&4));
        assert!(!priorities.contains_key(&5));
    }
}
