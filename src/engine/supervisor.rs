//! Bounded-retry supervision of account cycles.
//!
//! Each account gets up to `retry_attempts` attempts with a fixed delay
//! between them; exhaustion logs a final failure and moves on, so one
//! account can never abort the batch. A fixed delay separates accounts to
//! stay under the remote's implicit rate limits.

use crate::api::BoxApi;
use crate::config::Config;
use crate::engine::cycle::AccountCycle;
use crate::scheduler::CronGate;
use crate::types::Account;
use anyhow::Result;
use std::sync::Arc;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepMode {
    /// Claim sweep plus start phase
    Full,
    /// Claim sweep only (periodic check trigger)
    ClaimOnly,
}

pub struct Supervisor {
    cycle: AccountCycle,
    config: Config,
}

impl Supervisor {
    pub fn new(api: Arc<dyn BoxApi>, config: Config) -> Self {
        Self {
            cycle: AccountCycle::new(api, config.clone()),
            config,
        }
    }

    /// Run a full cycle (claim + start) for every account, sequentially.
    pub async fn process_accounts(&self, accounts: &[Account]) {
        self.sweep(accounts, SweepMode::Full).await;
    }

    /// Run the claim-only sweep for every account, sequentially.
    pub async fn claim_sweep_accounts(&self, accounts: &[Account]) {
        self.sweep(accounts, SweepMode::ClaimOnly).await;
    }

    async fn sweep(&self, accounts: &[Account], mode: SweepMode) {
        let attempts = self.config.api.retry_attempts.max(1);
        for account in accounts {
            let strategy = FixedInterval::new(self.config.retry_delay()).take(attempts - 1);
            let result = Retry::spawn(strategy, || async {
                match mode {
                    SweepMode::Full => self.cycle.run_cycle(account).await,
                    SweepMode::ClaimOnly => self.cycle.claim_sweep(account).await,
                }
            })
            .await;

            match result {
                Ok(report) => {
                    info!(
                        "[{}] account finished: {} action(s), {} failure(s)",
                        account.name,
                        report.actions(),
                        report.failed
                    );
                }
                Err(error) => {
                    error!(
                        "[{}] giving up after {} attempt(s): {:#}",
                        account.name, attempts, error
                    );
                }
            }

            tokio::time::sleep(self.config.delay_between_accounts()).await;
        }
    }

    /// Full-cycle loop: one batch immediately, then one per schedule fire,
    /// forever.
    pub async fn run_forever(&self, accounts: &[Account], gate: &CronGate) -> Result<()> {
        loop {
            info!("starting full cycle over {} account(s)", accounts.len());
            self.process_accounts(accounts).await;
            info!("full cycle complete, waiting for the next scheduled run");
            gate.wait_next().await?;
        }
    }
}
