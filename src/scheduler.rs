//! Cron-expression triggers for the two loops.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::str::FromStr;
use tracing::info;

/// A parsed cron schedule evaluated in a configured timezone. Awaiting
/// [`CronGate::wait_next`] sleeps until the next fire time.
pub struct CronGate {
    schedule: Schedule,
    timezone: Tz,
}

impl CronGate {
    pub fn new(expression: &str, timezone: &str) -> Result<Self> {
        let timezone: Tz = timezone
            .parse()
            .map_err(|e| anyhow!("invalid timezone '{}': {}", timezone, e))?;
        let normalized = normalize(expression);
        let schedule = Schedule::from_str(&normalized)
            .with_context(|| format!("invalid cron expression '{}'", expression))?;
        Ok(Self { schedule, timezone })
    }

    /// The next fire time, in UTC.
    pub fn next_fire(&self) -> Option<DateTime<Utc>> {
        self.schedule
            .upcoming(self.timezone)
            .next()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Sleep until the next scheduled fire.
    pub async fn wait_next(&self) -> Result<()> {
        let next = self
            .next_fire()
            .context("schedule has no upcoming fire time")?;
        info!("next scheduled run at {}", next.with_timezone(&self.timezone));
        let wait = next
            .signed_duration_since(Utc::now())
            .to_std()
            .unwrap_or_default();
        tokio::time::sleep(wait).await;
        Ok(())
    }
}

/// The cron crate wants a seconds field; accept classic 5-field entries by
/// prepending one.
fn normalize(expression: &str) -> String {
    if expression.split_whitespace().count() == 5 {
        format!("0 {}", expression)
    } else {
        expression.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_field_expressions_are_accepted() {
        let gate = CronGate::new("0 9 * * *", "Asia/Jakarta").unwrap();
        assert!(gate.next_fire().is_some());
    }

    #[test]
    fn test_six_field_expressions_pass_through() {
        assert_eq!(normalize("30 0 9 * * *"), "30 0 9 * * *");
        assert_eq!(normalize("0 */4 * * *"), "0 0 */4 * * *");
        let gate = CronGate::new("0 */4 * * *", "UTC").unwrap();
        assert!(gate.next_fire().is_some());
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        assert!(CronGate::new("not a schedule", "UTC").is_err());
        assert!(CronGate::new("0 9 * * *", "Mars/Olympus").is_err());
    }

    #[test]
    fn test_next_fire_is_in_the_future() {
        let gate = CronGate::new("0 9 * * *", "UTC").unwrap();
        let next = gate.next_fire().unwrap();
        assert!(next > Utc::now());
    }
}
