//! Main entry point for the boxminer automation client.

use anyhow::Result;
use boxminer::accounts::load_accounts;
use boxminer::api::HttpBoxApi;
use boxminer::config::Config;
use boxminer::engine::Supervisor;
use boxminer::scheduler::CronGate;
use std::sync::Arc;
use tracing::{error, info, Level};

const CONFIG_FILE: &str = "config.json";
const COOKIE_FILE: &str = "cookie.txt";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = Config::load(CONFIG_FILE)?;
    let accounts = load_accounts(COOKIE_FILE)?;

    let api = Arc::new(HttpBoxApi::new(&config)?);
    let supervisor = Arc::new(Supervisor::new(api, config.clone()));

    let daily_gate = CronGate::new(&config.scheduler.daily_schedule, &config.scheduler.timezone)?;
    let check_gate = CronGate::new(
        &config.scheduler.check_ready_schedule,
        &config.scheduler.timezone,
    )?;

    // Claim-only sweep on its own schedule. The account list is reloaded
    // fresh on every fire so cookie.txt edits are picked up.
    let sweep_supervisor = supervisor.clone();
    tokio::spawn(async move {
        loop {
            if let Err(e) = check_gate.wait_next().await {
                error!("claim-check trigger stopped: {:#}", e);
                break;
            }
            info!("claim-check trigger fired");
            match load_accounts(COOKIE_FILE) {
                Ok(accounts) => sweep_supervisor.claim_sweep_accounts(&accounts).await,
                Err(e) => error!("claim-check sweep skipped: {:#}", e),
            }
        }
    });

    info!(
        "box automation ready: full cycle '{}', claim check '{}' ({})",
        config.scheduler.daily_schedule,
        config.scheduler.check_ready_schedule,
        config.scheduler.timezone
    );

    supervisor.run_forever(&accounts, &daily_gate).await
}
