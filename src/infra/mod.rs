use crate::{adapters::persistence::PostgresPersistence, infra::db::init_db};

pub mod app;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod reconcile;
pub mod setup;

pub async fn postgres_persistence(
    database_url: &str,
    max_connections: u32,
) -> anyhow::Result<PostgresPersistence> {
    let pool = init_db(database_url, max_connections).await?;
    let persistence = PostgresPersistence::new(pool);
    Ok(persistence)
}
