//! Core types and data structures for the boxminer automation client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single game account, identified by an opaque name and authenticated
/// with a pre-obtained session cookie blob.
#[derive(Debug, Clone)]
pub struct Account {
    /// Opaque display name, e.g. "account_1"
    pub name: String,
    /// Full cookie string sent with every request for this account
    pub cookie: String,
}

impl Account {
    pub fn new(name: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cookie: cookie.into(),
        }
    }
}

/// A box as reported by the remote system. All state here is externally
/// owned; the client fetches a fresh snapshot before every decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxRecord {
    /// Stable opaque identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name, used for priority matching and logging
    #[serde(default)]
    pub name: String,
    /// Whether this box participates in automation at all
    #[serde(default)]
    pub active: bool,
    /// When mining was started; None if never started
    #[serde(rename = "startTime", default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Whether the mining duration has elapsed and the reward is claimable
    #[serde(rename = "isReady", default)]
    pub is_ready: bool,
    /// Whether the box has already been claimed (terminal)
    #[serde(default)]
    pub opened: bool,
    /// Projected/actual time the box becomes ready
    #[serde(rename = "readyAt", default)]
    pub ready_at: Option<DateTime<Utc>>,
    /// Comma-separated mission URLs required before a claim succeeds,
    /// present only when the remote demands it
    #[serde(rename = "missionUrl", default)]
    pub mission_url: Option<String>,
}

/// Derived classification of a box, never stored. Re-derived from a fresh
/// detail fetch after every mutating action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxState {
    /// active == false; no action regardless of other fields
    Inactive,
    /// opened == true; terminal
    Opened,
    /// Mining in progress, reward not yet claimable
    Mining,
    /// Reward claimable now
    ReadyToClaim,
    /// Never started, eligible for start_mining
    Startable,
    /// Matches no classification branch; logged, never acted on
    Unknown,
}

impl BoxState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoxState::Inactive => "inactive",
            BoxState::Opened => "opened",
            BoxState::Mining => "mining",
            BoxState::ReadyToClaim => "ready_to_claim",
            BoxState::Startable => "startable",
            BoxState::Unknown => "unknown",
        }
    }
}

/// Receipt returned by a successful start_mining call.
#[derive(Debug, Clone)]
pub struct StartReceipt {
    pub ready_at: Option<DateTime<Utc>>,
    pub prize_amount: Option<f64>,
    pub prize_type: Option<String>,
}

/// Receipt returned by a successful claim call.
#[derive(Debug, Clone)]
pub struct ClaimReceipt {
    pub prize_amount: Option<f64>,
    pub prize_type: Option<String>,
}

/// Outcome of a complete_mission call. The remote reporting a mission as
/// already done counts as satisfied, not as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionOutcome {
    Completed,
    AlreadyCompleted,
}

/// Per-account summary of one cycle (or claim-only sweep).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Boxes successfully claimed this cycle
    pub claimed: u32,
    /// Boxes on which mining was started this cycle (0 or 1)
    pub started: u32,
    /// Boxes skipped (inactive, already opened)
    pub skipped: u32,
    /// Box-level failures contained within the cycle
    pub failed: u32,
}

impl CycleReport {
    pub fn actions(&self) -> u32 {
        self.claimed + self.started
    }
}
