use std::collections::HashMap;
use std::time::Instant;

use itertools::Itertools;
use tracing::{debug, info, span, warn, Level};

use crate::domain::error::SweepError;
use crate::domain::frontier::Frontier;
use crate::domain::types::{Solution, SweepConfig, SystemId, SystemSet};
use crate::graph::Graph;
use crate::inventory::InventoryIndex;
use crate::packing::pack;
use crate::solver::resolver::TourResolver;

/// Top-value powerset sweep: consider systems in descending order of their
/// best site value; for each newcomer, try every subset of the systems
/// considered so far together with it, resolve the shortest round trips over
/// each required set, and fold the packed results into the frontier.
///
/// The wall-clock deadline is polled between candidate subsets; a tour
/// resolution in flight always runs to completion.
pub struct PowersetSweep<'g> {
    inventory: &'g InventoryIndex,
    config: SweepConfig,
    resolver: TourResolver<'g>,
    // visited-set -> node count of the shortest tour seen over it
    known_system_sets: HashMap<SystemSet, usize>,
    frontier: Frontier,
}

impl<'g> PowersetSweep<'g> {
    pub fn new(
        graph: &'g Graph,
        inventory: &'g InventoryIndex,
        origin: SystemId,
        config: SweepConfig,
    ) -> Self {
        let resolver = TourResolver::new(graph, origin, config.max_segment_length);
        PowersetSweep {
            inventory,
            config,
            resolver,
            known_system_sets: HashMap::new(),
            frontier: Frontier::new(),
        }
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Run until the candidate list is exhausted or the time budget expires.
    /// Either way the frontier holds everything found so far.
    pub fn run(&mut self) -> &Frontier {
        let run_span = span!(Level::INFO, "powerset_sweep", origin = self.resolver.origin());
        let _guard = run_span.enter();

        let deadline = Instant::now() + self.config.time_budget;
        let ordered = self.inventory.systems_by_value_desc();
        info!("sweeping {} systems with sites", ordered.len());

        let mut previous_systems: Vec<SystemId> = vec![];
        'sweep: for &new_system in &ordered {
            for subset in previous_systems.iter().copied().powerset() {
                if Instant::now() >= deadline {
                    info!("time budget expired, keeping the frontier as-is");
                    break 'sweep;
                }
                let mut required = subset;
                required.push(new_system);
                debug!("required systems {:?}", required);

                let tours = match self.shortest_tours(&required) {
                    Ok(tours) => tours,
                    Err(SweepError::NoRouteFound { required }) => {
                        debug!("no route for {:?}, skipping subset", required);
                        continue;
                    }
                    Err(other) => {
                        warn!("skipping subset after error: {other}");
                        continue;
                    }
                };
                for tour in tours {
                    let systems = SystemSet::from_systems(tour.iter().copied());
                    let candidates = self.inventory.sites_in_all(systems.iter());
                    let load = pack(&candidates, self.config.volume_budget);
                    let solution = Solution::new(tour, load);
                    if self.frontier.update(solution) {
                        debug!("frontier improved");
                    }
                }
            }
            previous_systems.push(new_system);
        }

        &self.frontier
    }

    /// All minimum-length round trips through `required` in any order:
    /// permutations are scored by segment-distance sums with pruning, tied
    /// minima expand into full tours, and tours over an already-seen system
    /// set are dropped.
    fn shortest_tours(
        &mut self,
        required: &[SystemId],
    ) -> Result<Vec<Vec<SystemId>>, SweepError> {
        let origin = self.resolver.origin();
        let mut shortest = u32::MAX;
        let mut tied_waypoints: Vec<Vec<SystemId>> = vec![];
        for permutation in required.iter().copied().permutations(required.len()) {
            let mut waypoints = Vec::with_capacity(permutation.len() + 2);
            waypoints.push(origin);
            waypoints.extend(permutation);
            waypoints.push(origin);

            match self.resolver.waypoint_length(&waypoints, shortest) {
                Some(length) if length < shortest => {
                    shortest = length;
                    tied_waypoints = vec![waypoints];
                }
                Some(length) if length == shortest => tied_waypoints.push(waypoints),
                _ => {}
            }
        }
        if tied_waypoints.is_empty() {
            return Err(SweepError::NoRouteFound {
                required: required.to_vec(),
            });
        }

        let mut tours = vec![];
        for waypoints in tied_waypoints {
            for tour in self.resolver.expand_waypoints(&waypoints) {
                let visited = SystemSet::from_systems(tour.iter().copied());
                match self.known_system_sets.get(&visited) {
                    Some(&known) if known > tour.len() => {
                        warn!(
                            "unexpectedly shorter tour over a known system set: {} vs {} nodes",
                            tour.len(),
                            known
                        );
                        self.known_system_sets.insert(visited, tour.len());
                        tours.push(tour);
                    }
                    Some(_) => debug!("duplicate system set, dropping tour"),
                    None => {
                        self.known_system_sets.insert(visited, tour.len());
                        tours.push(tour);
                    }
                }
            }
        }
        Ok(tours)
    }
}
