use chrono::Utc;
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;
use tracing::{info, warn};

use crate::domain::types::{SiteId, SystemId};

pub async fn db_connection() -> Result<SqlitePool, Box<dyn Error>> {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        warn!("DATABASE_URL not set, using default SQLite file");
        "sqlite:static_data.sqlite".to_string()
    });

    let options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    info!("Connected to SQLite database at {database_url}");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS api_tokens (
            service TEXT PRIMARY KEY,
            token TEXT NOT NULL,
            expiry INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    Ok(pool)
}

/// Directed jump rows from the static data dump. Each travel direction is
/// stored as its own row; the graph constructor checks the reverses exist.
pub async fn load_system_jumps(
    pool: &SqlitePool,
) -> Result<Vec<(SystemId, SystemId)>, sqlx::Error> {
    let rows = sqlx::query(
        "select fromSolarSystemID, toSolarSystemID from mapSolarSystemJumps order by fromSolarSystemID",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .iter()
        .map(|row| {
            (
                row.get::<i64, _>(0) as SystemId,
                row.get::<i64, _>(1) as SystemId,
            )
        })
        .collect())
}

pub async fn load_system_names(
    pool: &SqlitePool,
) -> Result<HashMap<SystemId, String>, sqlx::Error> {
    let rows = sqlx::query("select solarSystemID, solarSystemName from mapSolarSystems")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .iter()
        .map(|row| (row.get::<i64, _>(0) as SystemId, row.get::<String, _>(1)))
        .collect())
}

pub async fn load_site_names(pool: &SqlitePool) -> Result<HashMap<SiteId, String>, sqlx::Error> {
    let rows = sqlx::query("select stationID, stationName from staStations")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .iter()
        .map(|row| (row.get::<i64, _>(0) as SiteId, row.get::<String, _>(1)))
        .collect())
}

pub async fn system_for_site(
    pool: &SqlitePool,
    site_id: SiteId,
) -> Result<Option<SystemId>, sqlx::Error> {
    let row = sqlx::query("select solarSystemID from staStations where stationID = ?")
        .bind(site_id as i64)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.get::<i64, _>(0) as SystemId))
}

/// Packaged volume of an item type; unknown types count as zero so a single
/// missing row cannot sink a whole inventory fetch.
pub async fn type_volume(pool: &SqlitePool, type_id: i64) -> f64 {
    match sqlx::query("select volume from invTypes where typeID = ?")
        .bind(type_id)
        .fetch_optional(pool)
        .await
    {
        Ok(Some(row)) => row.get::<f64, _>(0),
        Ok(None) => {
            warn!("unknown type {type_id}, assuming zero volume");
            0.0
        }
        Err(e) => {
            warn!("volume lookup failed for type {type_id}: {e}");
            0.0
        }
    }
}

/// Unexpired token previously stored for `service`, if any.
pub async fn cached_token(
    pool: &SqlitePool,
    service: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row = sqlx::query("select token, expiry from api_tokens where service = ?")
        .bind(service)
        .fetch_optional(pool)
        .await?;
    let now = Utc::now().timestamp();
    Ok(row.and_then(|r| {
        if r.get::<i64, _>(1) > now {
            Some(r.get::<String, _>(0))
        } else {
            info!("cached {service} token has expired");
            None
        }
    }))
}

pub async fn store_token(
    pool: &SqlitePool,
    service: &str,
    token: &str,
    expiry: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO api_tokens (service, token, expiry)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(service)
    .bind(token)
    .bind(expiry)
    .execute(pool)
    .await?;
    info!("Stored new {service} token with expiry {expiry}");
    Ok(())
}
