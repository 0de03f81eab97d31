//! Mission resolution for claim prerequisites.

use crate::api::BoxApi;
use crate::config::Config;
use crate::types::{Account, BoxRecord, MissionOutcome};
use tracing::{debug, error, info, warn};

/// Outcome of a mission-resolution pass over one box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Every listed mission is satisfied; the caller may re-attempt the
    /// claim exactly once.
    Resolved,
    /// At least one mission failed (or the box reported none); the claim is
    /// final-failed for this cycle.
    Unresolved,
}

/// Walks a box's mission URLs in listed order, stopping at the first
/// unrecoverable failure. "Already completed" responses count as satisfied
/// so a repeated pass stays idempotent.
pub struct MissionResolver<'a> {
    api: &'a dyn BoxApi,
    config: &'a Config,
}

impl<'a> MissionResolver<'a> {
    pub fn new(api: &'a dyn BoxApi, config: &'a Config) -> Self {
        Self { api, config }
    }

    pub async fn resolve(&self, account: &Account, detail: &BoxRecord) -> Resolution {
        let urls = split_mission_urls(detail.mission_url.as_deref());
        if urls.is_empty() {
            // The remote demanded a mission but reports no mission URL;
            // retrying the claim blindly would loop, so give up here.
            warn!(
                "[{}] box '{}' requires a mission but lists no mission URL",
                account.name, detail.name
            );
            return Resolution::Unresolved;
        }

        for url in &urls {
            info!(
                "[{}] attempting mission for box '{}': {}",
                account.name, detail.name, url
            );
            match self.api.complete_mission(account, &detail.id, url).await {
                Ok(MissionOutcome::Completed) => {
                    info!("[{}] mission completed: {}", account.name, url);
                }
                Ok(MissionOutcome::AlreadyCompleted) => {
                    debug!("[{}] mission already satisfied: {}", account.name, url);
                }
                Err(error) => {
                    // Strict log-and-stop: remaining missions are not
                    // attempted once one fails.
                    error!(
                        "[{}] mission failed for box '{}' ({}): {}",
                        account.name, detail.name, url, error
                    );
                    return Resolution::Unresolved;
                }
            }
            tokio::time::sleep(self.config.delay_between_checks()).await;
        }

        Resolution::Resolved
    }
}

/// Split the comma-separated mission URL field, trimming entries and
/// dropping empties.
pub(crate) fn split_mission_urls(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_preserves_listed_order() {
        let urls = split_mission_urls(Some("u1, u2 ,u3"));
        assert_eq!(urls, vec!["u1", "u2", "u3"]);
    }

    #[test]
    fn test_split_drops_empties() {
        assert!(split_mission_urls(None).is_empty());
        assert!(split_mission_urls(Some("")).is_empty());
        assert!(split_mission_urls(Some(" , ,")).is_empty());
        assert_eq!(split_mission_urls(Some("u1,,u2")), vec!["u1", "u2"]);
    }
}
