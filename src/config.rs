//! Runtime configuration for the automation client.
//!
//! All settings are plain values handed to each component at construction;
//! there is no ambient/static configuration state. An optional JSON file
//! overrides the defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// API transport and retry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the remote game API
    pub base_url: String,
    /// Transport-level request timeout in milliseconds
    pub timeout_ms: u64,
    /// Attempts per account before the supervisor gives up for the cycle
    pub retry_attempts: usize,
    /// Delay between retry attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Fixed delay budget consumed by every API call, in milliseconds
    pub request_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.goblin.meme/api".to_string(),
            timeout_ms: 30_000,
            retry_attempts: 3,
            retry_delay_ms: 5_000,
            request_delay_ms: 2_500,
        }
    }
}

/// Cron-style trigger settings for the two loops.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Full cycle (claim + start) schedule expression
    pub daily_schedule: String,
    /// Claim-only sweep schedule expression
    pub check_ready_schedule: String,
    /// IANA timezone the schedule expressions are evaluated in
    pub timezone: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            daily_schedule: "0 9 * * *".to_string(),
            check_ready_schedule: "0 */4 * * *".to_string(),
            timezone: "Asia/Jakarta".to_string(),
        }
    }
}

/// Per-box and per-account processing behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Delay after each successful claim, in milliseconds
    pub delay_between_boxes_ms: u64,
    /// Short delay between mission attempts and before a re-claim
    pub delay_between_checks_ms: u64,
    /// Delay between accounts in a batch, in milliseconds
    pub delay_between_accounts_ms: u64,
    /// Whether Phase 2 (start mining) runs at all
    pub auto_start: bool,
    /// Whether ready boxes are claimed automatically
    pub auto_open: bool,
    /// Box name given first pick when selecting a box to start
    pub priority_box_name: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            delay_between_boxes_ms: 2_000,
            delay_between_checks_ms: 1_000,
            delay_between_accounts_ms: 10_000,
            auto_start: true,
            auto_open: true,
            priority_box_name: "The Mich Khan".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub scheduler: SchedulerConfig,
    pub processing: ProcessingConfig,
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file does not exist. A file that exists but fails to parse is a
    /// startup error, not a silent fallback.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.api.request_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.api.retry_delay_ms)
    }

    pub fn delay_between_boxes(&self) -> Duration {
        Duration::from_millis(self.processing.delay_between_boxes_ms)
    }

    pub fn delay_between_checks(&self) -> Duration {
        Duration::from_millis(self.processing.delay_between_checks_ms)
    }

    pub fn delay_between_accounts(&self) -> Duration {
        Duration::from_millis(self.processing.delay_between_accounts_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.api.retry_attempts, 3);
        assert_eq!(config.api.retry_delay_ms, 5_000);
        assert_eq!(config.api.request_delay_ms, 2_500);
        assert_eq!(config.processing.delay_between_boxes_ms, 2_000);
        assert_eq!(config.processing.delay_between_accounts_ms, 10_000);
        assert!(config.processing.auto_start);
        assert!(config.processing.auto_open);
        assert_eq!(config.processing.priority_box_name, "The Mich Khan");
        assert_eq!(config.scheduler.timezone, "Asia/Jakarta");
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_rest() {
        let raw = r#"{ "api": { "retry_attempts": 5 }, "processing": { "auto_start": false } }"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.api.retry_attempts, 5);
        assert!(!config.processing.auto_start);
        // untouched sections keep their defaults
        assert_eq!(config.api.request_delay_ms, 2_500);
        assert!(config.processing.auto_open);
        assert_eq!(config.scheduler.daily_schedule, "0 9 * * *");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load("/definitely/not/a/real/config.json").unwrap();
        assert_eq!(config.api.retry_attempts, 3);
    }
}
