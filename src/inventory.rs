use std::collections::HashMap;

use tracing::debug;

use crate::domain::error::SweepError;
use crate::domain::types::{Site, SiteId, SystemId};
use crate::graph::Graph;

/// Immutable index of pickup sites grouped by the system that hosts them.
/// The starting site is dropped during construction so the planner can never
/// "pick up" the cargo it departs with. Eligibility filtering (categories,
/// oversized items) happens upstream, before sites reach this index.
#[derive(Debug, Clone)]
pub struct InventoryIndex {
    by_system: HashMap<SystemId, Vec<Site>>,
    site_count: usize,
}

impl InventoryIndex {
    pub fn build(
        sites: Vec<Site>,
        starting_site_id: SiteId,
        graph: &Graph,
    ) -> Result<Self, SweepError> {
        let mut by_system: HashMap<SystemId, Vec<Site>> = HashMap::new();
        let mut site_count = 0;
        for site in sites {
            if site.site_id == starting_site_id {
                debug!("dropping starting site {} from the index", site.site_id);
                continue;
            }
            if !graph.contains(site.system_id) {
                return Err(SweepError::InvalidInventory {
                    reason: format!(
                        "site {} references unknown system {}",
                        site.site_id, site.system_id
                    ),
                });
            }
            by_system.entry(site.system_id).or_default().push(site);
            site_count += 1;
        }
        for sites in by_system.values_mut() {
            sites.sort_by(|a, b| {
                b.value
                    .total_cmp(&a.value)
                    .then(a.site_id.cmp(&b.site_id))
            });
        }
        Ok(InventoryIndex {
            by_system,
            site_count,
        })
    }

    /// Sites hosted by `system_id`, highest value first.
    pub fn sites_in(&self, system_id: SystemId) -> &[Site] {
        self.by_system
            .get(&system_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All sites across the given systems, materialized eagerly.
    pub fn sites_in_all(&self, systems: impl IntoIterator<Item = SystemId>) -> Vec<Site> {
        systems
            .into_iter()
            .flat_map(|s| self.sites_in(s).iter().cloned())
            .collect()
    }

    /// Highest single-site value hosted by `system_id`, or 0.
    pub fn best_value_in(&self, system_id: SystemId) -> f64 {
        self.sites_in(system_id)
            .first()
            .map(|s| s.value)
            .unwrap_or(0.0)
    }

    /// Systems that host at least one site, ordered by descending best site
    /// value (system id breaks ties).
    pub fn systems_by_value_desc(&self) -> Vec<SystemId> {
        let mut ranked: Vec<(f64, SystemId)> = self
            .by_system
            .keys()
            .map(|&s| (self.best_value_in(s), s))
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        ranked.into_iter().map(|(_, s)| s).collect()
    }

    pub fn len(&self) -> usize {
        self.site_count
    }

    pub fn is_empty(&self) -> bool {
        self.site_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(site_id: u64, system_id: u32, value: f64, volume: f64) -> Site {
        Site {
            site_id,
            system_id,
            value,
            volume,
        }
    }

    fn line_graph() -> Graph {
        Graph::from_undirected_edges([(1, 2), (2, 3)]).unwrap()
    }

    #[test]
    fn starting_site_never_appears() {
        let index = InventoryIndex::build(
            vec![site(999, 1, 500.0, 5.0), site(10, 2, 100.0, 5.0)],
            999,
            &line_graph(),
        )
        .unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.sites_in(1).is_empty());
        assert_eq!(index.sites_in(2)[0].site_id, 10);
    }

    #[test]
    fn unknown_system_is_rejected() {
        let err = InventoryIndex::build(vec![site(10, 42, 100.0, 5.0)], 999, &line_graph())
            .unwrap_err();
        assert!(matches!(err, SweepError::InvalidInventory { .. }));
    }

    #[test]
    fn sites_are_ordered_by_descending_value() {
        let index = InventoryIndex::build(
            vec![site(11, 2, 10.0, 1.0), site(12, 2, 90.0, 1.0), site(13, 2, 40.0, 1.0)],
            999,
            &line_graph(),
        )
        .unwrap();
        let values: Vec<f64> = index.sites_in(2).iter().map(|s| s.value).collect();
        assert_eq!(values, vec![90.0, 40.0, 10.0]);
        assert_eq!(index.best_value_in(2), 90.0);
        assert_eq!(index.best_value_in(3), 0.0);
    }

    #[test]
    fn systems_rank_by_best_site_value() {
        let index = InventoryIndex::build(
            vec![
                site(11, 1, 10.0, 1.0),
                site(12, 2, 90.0, 1.0),
                site(13, 3, 90.0, 1.0),
            ],
            999,
            &line_graph(),
        )
        .unwrap();
        assert_eq!(index.systems_by_value_desc(), vec![2, 3, 1]);
    }
}
