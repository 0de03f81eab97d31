//! Per-account cycle controller.
//!
//! One cycle is a two-phase pass over all of an account's boxes. Phase 1
//! claims every ready box, resolving mission prerequisites as needed.
//! Phase 2 starts mining on at most one box, and only when Phase 1 saw no
//! box already mining. Claiming a box changes the pool of available boxes
//! and the remote enforces at most one concurrently mining box per account,
//! so start decisions wait until the full claim sweep is done.
//!
//! Claiming in Phase 1 does not suppress Phase 2: claiming a reward and
//! starting a new mining run are independent entitlements in the remote
//! system.

use crate::api::{ApiError, BoxApi};
use crate::config::Config;
use crate::engine::classifier::classify;
use crate::engine::missions::{MissionResolver, Resolution};
use crate::types::{Account, BoxRecord, BoxState, ClaimReceipt, CycleReport};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct AccountCycle {
    api: Arc<dyn BoxApi>,
    config: Config,
}

impl AccountCycle {
    pub fn new(api: Arc<dyn BoxApi>, config: Config) -> Self {
        Self { api, config }
    }

    /// Full cycle: claim sweep, then the start phase.
    pub async fn run_cycle(&self, account: &Account) -> Result<CycleReport> {
        self.run(account, true).await
    }

    /// Claim-only sweep used by the periodic check trigger; never starts
    /// mining.
    pub async fn claim_sweep(&self, account: &Account) -> Result<CycleReport> {
        self.run(account, false).await
    }

    async fn run(&self, account: &Account, with_start_phase: bool) -> Result<CycleReport> {
        info!("[{}] processing account", account.name);

        match self.api.validate_session(account).await {
            Ok(true) => {}
            Ok(false) => {
                // Cookie presumed expired; skipping without retry, a fresh
                // attempt would fail the same way.
                error!("[{}] session invalid or expired, skipping account", account.name);
                return Ok(CycleReport::default());
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("session check failed for {}", account.name));
            }
        }

        // A listing failure is fatal for the account this attempt: with no
        // boxes there are no further decisions to make.
        let boxes = self
            .api
            .list_boxes(account)
            .await
            .with_context(|| format!("failed to list boxes for {}", account.name))?;

        if boxes.is_empty() {
            info!("[{}] no boxes reported for this account", account.name);
            return Ok(CycleReport::default());
        }

        let mut report = CycleReport::default();
        let mut active_mining: Option<BoxRecord> = None;

        info!("[{}] phase 1: claim sweep over {} box(es)", account.name, boxes.len());
        for summary in &boxes {
            self.sweep_box(account, summary, &mut report, &mut active_mining)
                .await;
        }

        if with_start_phase {
            self.start_phase(account, &boxes, active_mining.as_ref(), &mut report)
                .await?;
        }

        info!(
            "[{}] cycle done: {} claimed, {} started, {} skipped, {} failed",
            account.name, report.claimed, report.started, report.skipped, report.failed
        );
        Ok(report)
    }

    /// Phase 1 treatment of a single listed box. Box-level failures are
    /// contained here; they never abort the sweep.
    async fn sweep_box(
        &self,
        account: &Account,
        summary: &BoxRecord,
        report: &mut CycleReport,
        active_mining: &mut Option<BoxRecord>,
    ) {
        // List-level data may be stale; every decision works off a fresh
        // detail snapshot.
        let detail = match self.api.box_detail(account, &summary.id).await {
            Ok(detail) => detail,
            Err(error) => {
                error!(
                    "[{}] failed to fetch detail for box '{}': {}",
                    account.name, summary.name, error
                );
                report.failed += 1;
                return;
            }
        };

        match classify(&detail) {
            BoxState::Inactive => {
                debug!("[{}] box '{}' is inactive, skipping", account.name, detail.name);
                report.skipped += 1;
            }
            BoxState::Opened => {
                info!("[{}] box '{}' already claimed", account.name, detail.name);
                report.skipped += 1;
            }
            BoxState::ReadyToClaim => {
                if !self.config.processing.auto_open {
                    debug!(
                        "[{}] box '{}' is ready but auto_open is disabled",
                        account.name, detail.name
                    );
                    return;
                }
                info!("[{}] box '{}' is ready to claim", account.name, detail.name);
                match self.claim_with_mission_resolution(account, &detail).await {
                    Ok(receipt) => {
                        info!(
                            "[{}] claimed box '{}': {} {}",
                            account.name,
                            detail.name,
                            receipt.prize_amount.unwrap_or(0.0),
                            receipt.prize_type.as_deref().unwrap_or("?")
                        );
                        report.claimed += 1;
                        tokio::time::sleep(self.config.delay_between_boxes()).await;
                    }
                    Err(error) => {
                        error!(
                            "[{}] failed to claim box '{}': {}",
                            account.name, detail.name, error
                        );
                        report.failed += 1;
                    }
                }
            }
            BoxState::Mining => {
                if active_mining.is_some() {
                    // The remote should enforce at most one; keep the first
                    // encountered.
                    warn!(
                        "[{}] more than one box reports mining; ignoring '{}'",
                        account.name, detail.name
                    );
                } else {
                    log_remaining(account, &detail.name, detail.ready_at);
                    *active_mining = Some(detail);
                }
            }
            BoxState::Startable => {
                debug!(
                    "[{}] box '{}' is startable, deferred to phase 2",
                    account.name, detail.name
                );
            }
            BoxState::Unknown => {
                debug!(
                    "[{}] box '{}' matches no known state, leaving it alone: {:?}",
                    account.name, detail.name, detail
                );
            }
        }
    }

    /// Claim with bounded mission recovery: claim, and on a mission-required
    /// failure resolve the missions and claim exactly once more. A second
    /// failure of any kind is final for this box this cycle.
    async fn claim_with_mission_resolution(
        &self,
        account: &Account,
        detail: &BoxRecord,
    ) -> Result<ClaimReceipt, ApiError> {
        match self.api.claim(account, &detail.id).await {
            Ok(receipt) => Ok(receipt),
            Err(ApiError::MissionRequired) => {
                warn!(
                    "[{}] box '{}' requires missions before claiming",
                    account.name, detail.name
                );
                let resolver = MissionResolver::new(self.api.as_ref(), &self.config);
                match resolver.resolve(account, detail).await {
                    Resolution::Resolved => {
                        info!(
                            "[{}] missions satisfied for box '{}', re-attempting claim",
                            account.name, detail.name
                        );
                        tokio::time::sleep(self.config.delay_between_checks()).await;
                        self.api.claim(account, &detail.id).await
                    }
                    Resolution::Unresolved => Err(ApiError::MissionRequired),
                }
            }
            Err(error) => Err(error),
        }
    }

    /// Phase 2: start mining on at most one box, priority box first.
    async fn start_phase(
        &self,
        account: &Account,
        boxes: &[BoxRecord],
        active_mining: Option<&BoxRecord>,
        report: &mut CycleReport,
    ) -> Result<()> {
        info!("[{}] phase 2: start sweep", account.name);

        if !self.config.processing.auto_start {
            info!("[{}] auto_start is disabled", account.name);
            return Ok(());
        }

        if let Some(mining) = active_mining {
            warn!(
                "[{}] box '{}' is already mining, not starting another",
                account.name, mining.name
            );
            log_remaining(account, &mining.name, mining.ready_at);
            return Ok(());
        }

        let Some(selected) = self.select_startable(account, boxes).await else {
            info!("[{}] no box can be started this cycle", account.name);
            return Ok(());
        };

        info!(
            "[{}] starting mining on box '{}'",
            account.name, selected.name
        );
        match self.api.start_mining(account, &selected.id).await {
            Ok(receipt) => {
                report.started += 1;
                info!(
                    "[{}] mining started on '{}': {} {}",
                    account.name,
                    selected.name,
                    receipt.prize_amount.unwrap_or(0.0),
                    receipt.prize_type.as_deref().unwrap_or("?")
                );
                log_remaining(account, &selected.name, receipt.ready_at);
            }
            Err(ApiError::AlreadyMining) => {
                // Phase 1 saw no mining box moments ago, so this is a race
                // with another process; warn and carry on.
                warn!(
                    "[{}] start of '{}' raced an existing mining session",
                    account.name, selected.name
                );
            }
            Err(error) => {
                return Err(error).with_context(|| {
                    format!(
                        "failed to start mining on box '{}' for {}",
                        selected.name, account.name
                    )
                });
            }
        }
        Ok(())
    }

    /// Pick the box to start: the configured priority box if its fresh
    /// detail is startable, otherwise the first startable box in listing
    /// order.
    async fn select_startable(
        &self,
        account: &Account,
        boxes: &[BoxRecord],
    ) -> Option<BoxRecord> {
        let priority = &self.config.processing.priority_box_name;

        if let Some(summary) = boxes.iter().find(|b| b.name == *priority) {
            match self.api.box_detail(account, &summary.id).await {
                Ok(detail) if classify(&detail) == BoxState::Startable => {
                    info!(
                        "[{}] prioritizing box '{}' for mining",
                        account.name, detail.name
                    );
                    return Some(detail);
                }
                Ok(detail) => {
                    debug!(
                        "[{}] priority box '{}' is not startable ({})",
                        account.name,
                        detail.name,
                        classify(&detail).as_str()
                    );
                }
                Err(error) => {
                    error!(
                        "[{}] failed to fetch priority box detail: {}",
                        account.name, error
                    );
                }
            }
        }

        for summary in boxes.iter().filter(|b| b.name != *priority) {
            match self.api.box_detail(account, &summary.id).await {
                Ok(detail) if classify(&detail) == BoxState::Startable => {
                    info!(
                        "[{}] selected box '{}' for mining",
                        account.name, detail.name
                    );
                    return Some(detail);
                }
                Ok(_) => {}
                Err(error) => {
                    error!(
                        "[{}] failed to fetch detail for box '{}': {}",
                        account.name, summary.name, error
                    );
                }
            }
        }

        None
    }
}

/// Log how long until a mining box becomes claimable.
fn log_remaining(account: &Account, box_name: &str, ready_at: Option<DateTime<Utc>>) {
    let Some(ready_at) = ready_at else {
        debug!(
            "[{}] box '{}' has no readiness timestamp",
            account.name, box_name
        );
        return;
    };
    let left = ready_at.signed_duration_since(Utc::now());
    if left > chrono::Duration::zero() {
        let (hours, minutes, seconds) = split_hms(left.num_seconds());
        warn!(
            "[{}] box '{}' is mining, ready in {}h {}m {}s",
            account.name, box_name, hours, minutes, seconds
        );
    } else {
        warn!(
            "[{}] box '{}' should already be claimable, it will be picked up next sweep",
            account.name, box_name
        );
    }
}

fn split_hms(total_seconds: i64) -> (i64, i64, i64) {
    (
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_hms() {
        assert_eq!(split_hms(0), (0, 0, 0));
        assert_eq!(split_hms(59), (0, 0, 59));
        assert_eq!(split_hms(3_661), (1, 1, 1));
        assert_eq!(split_hms(86_399), (23, 59, 59));
    }
}
