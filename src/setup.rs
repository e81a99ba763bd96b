use std::collections::HashMap;
use std::env;
use std::error::Error;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::api::inventory_api::{access_token, fetch_site_summaries};
use crate::config::constant::{
    FIXTURE_SEED, FIXTURE_SITE_COUNT, FIXTURE_SYSTEM_COUNT, STARTING_SITE_ID, STARTING_SYSTEM_ID,
};
use crate::database::sqlx::{load_site_names, load_system_jumps, load_system_names};
use crate::domain::error::SweepError;
use crate::domain::types::{Site, SiteId, SystemId};
use crate::fixtures::data_generator::generate_scenario;
use crate::graph::Graph;
use crate::inventory::InventoryIndex;

/// Everything the planner core consumes, assembled from the static data
/// store and the inventory service, or from a seeded fixture when running
/// offline.
pub struct PlannerInput {
    pub graph: Graph,
    pub index: InventoryIndex,
    pub starting_system_id: SystemId,
    pub starting_site_id: SiteId,
    pub system_names: HashMap<SystemId, String>,
    pub site_names: HashMap<SiteId, String>,
}

pub async fn setup(pool: &SqlitePool) -> Result<PlannerInput, Box<dyn Error>> {
    match load_system_jumps(pool).await {
        Ok(rows) if !rows.is_empty() => {
            info!("Loaded {} jump rows from the static data store", rows.len());
            let graph = Graph::from_directed_rows(rows)?;

            let starting_system_id = env_or("STARTING_SYSTEM_ID", STARTING_SYSTEM_ID);
            let starting_site_id = env_or("STARTING_SITE_ID", STARTING_SITE_ID);
            if !graph.contains(starting_system_id) {
                return Err(Box::new(SweepError::InvalidGraph {
                    reason: format!("origin system {starting_system_id} is not in the graph"),
                }));
            }

            let sites = fetch_inventory(pool).await;
            let index = InventoryIndex::build(sites, starting_site_id, &graph)?;

            let system_names = load_system_names(pool).await.unwrap_or_default();
            let site_names = load_site_names(pool).await.unwrap_or_default();

            Ok(PlannerInput {
                graph,
                index,
                starting_system_id,
                starting_site_id,
                system_names,
                site_names,
            })
        }
        Ok(_) => {
            warn!("static data store has no jump rows, generating a fixture scenario");
            fixture_input()
        }
        Err(e) => {
            warn!("could not read the static data store ({e}), generating a fixture scenario");
            fixture_input()
        }
    }
}

async fn fetch_inventory(pool: &SqlitePool) -> Vec<Site> {
    let base_url = match env::var("INVENTORY_API_URL") {
        Ok(url) => url,
        Err(_) => {
            warn!("INVENTORY_API_URL not set, starting with an empty inventory");
            return vec![];
        }
    };
    let character_id: u64 = match env::var("INVENTORY_CHARACTER_ID")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        Some(id) => id,
        None => {
            warn!("INVENTORY_CHARACTER_ID missing or invalid, starting with an empty inventory");
            return vec![];
        }
    };
    let Some(token) = access_token(pool).await else {
        warn!("no inventory credentials available, starting with an empty inventory");
        return vec![];
    };
    fetch_site_summaries(&base_url, character_id, &token, pool)
        .await
        .unwrap_or_else(|| {
            warn!("inventory fetch failed, starting with an empty inventory");
            vec![]
        })
}

fn fixture_input() -> Result<PlannerInput, Box<dyn Error>> {
    let scenario = generate_scenario(FIXTURE_SYSTEM_COUNT, FIXTURE_SITE_COUNT, FIXTURE_SEED);
    let graph = Graph::from_undirected_edges(scenario.edges)?;
    let index = InventoryIndex::build(scenario.sites, scenario.starting_site_id, &graph)?;
    Ok(PlannerInput {
        graph,
        index,
        starting_system_id: scenario.starting_system_id,
        starting_site_id: scenario.starting_site_id,
        system_names: HashMap::new(),
        site_names: HashMap::new(),
    })
}

fn env_or<T: std::str::FromStr + Copy>(key: &str, fallback: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}
