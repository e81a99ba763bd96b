use std::collections::HashMap;
use std::env;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use crate::database::sqlx::{cached_token, store_token, system_for_site, type_volume};
use crate::domain::types::{Site, SiteId};

// ships and drones cannot be hauled as cargo
const EXCLUDED_CATEGORIES: [i64; 2] = [6, 18];
// anything this bulky (station containers and the like) stays behind
const MAX_ITEM_VOLUME: f64 = 3000.0;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct AssetRow {
    type_id: i64,
    category_id: i64,
    location_id: i64,
    location_type: String,
    #[serde(default = "one")]
    quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
struct MarketPrice {
    type_id: i64,
    #[serde(default)]
    average_price: f64,
}

/// Bearer token for the inventory service: a fresh one from the environment
/// (stored for later runs) or the unexpired cached one.
pub async fn access_token(pool: &SqlitePool) -> Option<String> {
    if let Ok(token) = env::var("INVENTORY_TOKEN") {
        let expiry = (Utc::now() + chrono::Duration::minutes(20)).timestamp();
        if let Err(e) = store_token(pool, "inventory", &token, expiry).await {
            warn!("could not cache inventory token: {e}");
        }
        return Some(token);
    }
    match cached_token(pool, "inventory").await {
        Ok(Some(token)) => {
            info!("Using cached inventory token");
            Some(token)
        }
        Ok(None) => None,
        Err(e) => {
            warn!("token cache lookup failed: {e}");
            None
        }
    }
}

/// Pull the character's assets from the inventory service, price them, and
/// collapse them into one value/volume summary per site. Ineligible items
/// (excluded categories, oversized, not parked at a station) are dropped
/// here, before the planner ever sees them.
pub async fn fetch_site_summaries(
    base_url: &str,
    character_id: u64,
    access_token: &str,
    pool: &SqlitePool,
) -> Option<Vec<Site>> {
    let client = Client::new();

    let assets = fetch_assets(&client, base_url, character_id, access_token).await?;
    info!("Fetched {} asset rows", assets.len());
    let prices = fetch_market_prices(&client, base_url).await?;

    let mut totals: HashMap<SiteId, (f64, f64)> = HashMap::new();
    for asset in assets {
        if asset.location_type != "station" {
            continue;
        }
        if EXCLUDED_CATEGORIES.contains(&asset.category_id) {
            continue;
        }
        let volume = type_volume(pool, asset.type_id).await;
        if volume >= MAX_ITEM_VOLUME {
            continue;
        }
        let price = prices.get(&asset.type_id).copied().unwrap_or(0.0);
        let quantity = asset.quantity.max(1) as f64;
        let entry = totals.entry(asset.location_id as SiteId).or_insert((0.0, 0.0));
        entry.0 += price * quantity;
        entry.1 += volume * quantity;
    }

    let mut ordered: Vec<(SiteId, (f64, f64))> = totals.into_iter().collect();
    ordered.sort_by_key(|(site_id, _)| *site_id);

    let mut sites = vec![];
    for (site_id, (value, volume)) in ordered {
        match system_for_site(pool, site_id).await {
            Ok(Some(system_id)) => sites.push(Site {
                site_id,
                system_id,
                value,
                volume,
            }),
            Ok(None) => warn!("site {site_id} has no known system, dropping it"),
            Err(e) => warn!("system lookup failed for site {site_id}: {e}"),
        }
    }
    info!("Summarized assets across {} sites", sites.len());
    Some(sites)
}

// First page synchronously to learn the page count, remaining pages fetched
// concurrently.
async fn fetch_assets(
    client: &Client,
    base_url: &str,
    character_id: u64,
    access_token: &str,
) -> Option<Vec<AssetRow>> {
    let url = format!("{base_url}/characters/{character_id}/assets/");
    debug!("Fetching assets from {url}");

    let response = match client
        .get(&url)
        .bearer_auth(access_token)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            error!("asset request failed: {e}");
            return None;
        }
    };
    if !response.status().is_success() {
        error!("inventory service returned HTTP {}", response.status());
        return None;
    }
    let pages: u32 = response
        .headers()
        .get("x-pages")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);

    let mut rows: Vec<AssetRow> = match response.json().await {
        Ok(rows) => rows,
        Err(e) => {
            error!("failed to parse asset page 1: {e}");
            return None;
        }
    };

    if pages > 1 {
        debug!("Fetching {} additional asset pages", pages - 1);
        let tasks = (2..=pages).map(|page| {
            let client = client.clone();
            let url = url.clone();
            let token = access_token.to_string();
            async move {
                let response = client
                    .get(&url)
                    .query(&[("page", page)])
                    .bearer_auth(&token)
                    .timeout(REQUEST_TIMEOUT)
                    .send()
                    .await
                    .ok()?;
                response.json::<Vec<AssetRow>>().await.ok()
            }
        });
        for page_rows in join_all(tasks).await {
            match page_rows {
                Some(mut more) => rows.append(&mut more),
                None => {
                    error!("an asset page failed, aborting the fetch");
                    return None;
                }
            }
        }
    }
    Some(rows)
}

async fn fetch_market_prices(client: &Client, base_url: &str) -> Option<HashMap<i64, f64>> {
    let url = format!("{base_url}/markets/prices/");
    debug!("Fetching market prices from {url}");

    let response = match client.get(&url).timeout(REQUEST_TIMEOUT).send().await {
        Ok(resp) => resp,
        Err(e) => {
            error!("market price request failed: {e}");
            return None;
        }
    };
    if !response.status().is_success() {
        error!("market price endpoint returned HTTP {}", response.status());
        return None;
    }
    let prices: Vec<MarketPrice> = match response.json().await {
        Ok(prices) => prices,
        Err(e) => {
            error!("failed to parse market prices: {e}");
            return None;
        }
    };
    info!("Loaded {} market prices", prices.len());
    Some(
        prices
            .into_iter()
            .map(|p| (p.type_id, p.average_price))
            .collect(),
    )
}
