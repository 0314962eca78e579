use super::ui;
use crate::config::AppConfig;
use crate::error::SyncError;
use crate::providers::fred::FredClient;
use crate::providers::sgs::SgsClient;
use crate::store::SnapshotStore;
use crate::sync::SyncEngine;
use anyhow::{Result, anyhow};
use tracing::info;

pub async fn run(config: &AppConfig, years: u32) -> Result<()> {
    info!("Refreshing series for a {years}-year window...");

    let api_key = config.fred_api_key()?;
    let store = SnapshotStore::new(&config.snapshot_path);
    let sgs = SgsClient::new(&config.sgs_base_url);
    let fred = FredClient::new(&config.fred_base_url, api_key);

    let engine = SyncEngine::new(&store, &sgs, &fred, years);

    let pb = ui::new_spinner("downloading series");
    let result = engine.sync().await;
    pb.finish_and_clear();

    let snapshot = result.map_err(|e| match e {
        SyncError::Fetch(e) => anyhow!("failed to download data ({e}); try again"),
        other => anyhow::Error::from(other),
    })?;

    match (snapshot.series.first_date(), snapshot.series.last_date()) {
        (Some(first), Some(last)) => {
            println!(
                "saved {} dates from {} to {}",
                snapshot.series.len(),
                first,
                last
            );
        }
        _ => println!("saved 0 dates"),
    }
    Ok(())
}
