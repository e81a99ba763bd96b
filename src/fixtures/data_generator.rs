use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::domain::types::{Site, SiteId, SystemId};

const STARTING_SYSTEM: SystemId = 1;
const STARTING_SITE: SiteId = 999;

#[derive(Debug)]
pub struct GeneratedScenario {
    pub edges: Vec<(SystemId, SystemId)>,
    pub sites: Vec<Site>,
    pub starting_system_id: SystemId,
    pub starting_site_id: SiteId,
}

/// Seeded random scenario for offline runs and tests: a chain backbone keeps
/// every system reachable, random chords add shortcut loops, and sites land
/// on random non-origin systems with varied value/volume.
pub fn generate_scenario(system_count: usize, site_count: usize, seed: u64) -> GeneratedScenario {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut edges: Vec<(SystemId, SystemId)> = (1..system_count as SystemId)
        .map(|i| (i, i + 1))
        .collect();

    let chord_target = system_count / 3;
    let mut chords = 0;
    while chords < chord_target {
        let a = rng.gen_range(1..=system_count as SystemId);
        let b = rng.gen_range(1..=system_count as SystemId);
        if a == b || edges.contains(&(a, b)) || edges.contains(&(b, a)) {
            continue;
        }
        edges.push((a, b));
        chords += 1;
    }

    let mut sites = vec![];
    for i in 0..site_count {
        let system_id = rng.gen_range(2..=system_count as SystemId);
        let value = rng.gen_range(10_000.0..2_000_000.0);
        let volume = rng.gen_range(5.0..400.0);
        sites.push(Site {
            site_id: 1_000 + i as SiteId,
            system_id,
            value,
            volume,
        });
    }

    info!(
        "Generated scenario: {} systems, {} edges, {} sites (seed {seed})",
        system_count,
        edges.len(),
        sites.len()
    );

    GeneratedScenario {
        edges,
        sites,
        starting_system_id: STARTING_SYSTEM,
        starting_site_id: STARTING_SITE,
    }
}
