pub mod capture;
pub mod contribution;
pub mod db;
pub mod feed;
pub mod leaderboard;
pub mod ledger;
pub mod models;
pub mod rewards;
pub mod scoring;
pub mod settings;
mod utils;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use contribution::{ContributionController, DashboardEvent};
use db::Database;
use feed::SimulatedFeed;
use ledger::HistoryLedger;
use log::{info, warn};
use rewards::REWARD_CATALOG;
use settings::{AppSettings, SettingsStore};
use tokio::sync::broadcast::error::RecvError;

const DEFAULT_DATA_DIR: &str = "ecoenergy-data";
const DEFAULT_USER: &str = "citizen-1";

fn debug_mode() -> bool {
    std::env::var("ECOENERGY_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Run a simulated contribution session until Ctrl-C.
pub fn run() -> Result<()> {
    // Initialize logging (RUST_LOG overrides the default level)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("EcoEnergy starting up...");

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(run_session())
}

async fn run_session() -> Result<()> {
    let data_dir = std::env::var("ECOENERGY_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
    let user_id = std::env::var("ECOENERGY_USER").unwrap_or_else(|_| DEFAULT_USER.to_string());

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let settings_store = SettingsStore::new(data_dir.join("settings.json"))?;
    let mut settings = settings_store.get();
    if debug_mode() {
        apply_debug_cadence(&mut settings);
    }

    let database = Database::new(data_dir.join("ecoenergy.sqlite3"))?;
    let ledger = HistoryLedger::open(database, user_id.clone()).await?;

    let feed = Arc::new(SimulatedFeed::new(settings.simulated_feed_config()));
    let controller = ContributionController::new(feed, ledger, &settings).await?;

    let mut events = controller.subscribe_events();
    let event_logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Dashboard lagged; {skipped} events skipped"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    controller.start().await?;
    if !settings.auto_submit {
        info!("Automatic submission disabled; finalized readings wait in the form");
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutting down contribution session");

    controller.stop().await?;
    event_logger.abort();

    report(&controller, &user_id, &data_dir).await
}

fn apply_debug_cadence(settings: &mut AppSettings) {
    settings.simulation.sample_interval_ms = 200;
    settings.simulation.quiet_period_ms = settings.feed.inactivity_timeout_ms + 1_000;
}

fn log_event(event: &DashboardEvent) {
    match serde_json::to_string(event) {
        Ok(json) => info!("dashboard event: {json}"),
        Err(err) => warn!("Failed to serialize dashboard event: {err}"),
    }
}

async fn report(
    controller: &ContributionController,
    user_id: &str,
    data_dir: &std::path::Path,
) -> Result<()> {
    let summary = controller.summary().await;
    let impact = summary.impact();
    info!(
        "History for {user_id}: {} entries ({} auto-filled, {} manual), wet={:.1}g dry={:.1}g, {} eco-points",
        summary.count,
        summary.auto_filled_count,
        summary.manual_count,
        summary.total_wet_grams,
        summary.total_dry_grams,
        summary.total_points
    );
    info!(
        "Estimated impact: {:.3} m³ biogas, {} meals",
        impact.biogas_m3, impact.meals
    );

    let wallet = controller.wallet().await;
    let affordable: Vec<&str> = REWARD_CATALOG
        .iter()
        .filter(|reward| wallet.can_redeem(reward))
        .map(|reward| reward.name)
        .collect();
    info!(
        "Wallet balance {} eco-points; redeemable rewards: {:?}",
        wallet.balance(),
        affordable
    );

    let standings_path = data_dir.join("standings.json");
    if standings_path.exists() {
        let standings = leaderboard::load_standings(&standings_path)?;
        for ranked in leaderboard::rank_citizens(&standings).iter().take(3) {
            info!(
                "{} {} with {} eco-points",
                ranked.badge.label(),
                ranked.standing.name,
                ranked.standing.eco_points
            );
        }
        let community = leaderboard::community_summary(&standings);
        info!(
            "Community: {} citizens, {} eco-points, {:.1}kg waste diverted",
            standings.len(),
            community.total_points,
            community.total_waste
        );
    }

    Ok(())
}
