//! boxminer - scheduled account automation for a box mining/claiming game.
//!
//! Given a set of session cookies, the client periodically polls the remote
//! HTTP API, decides which boxes are claimable or startable, and issues the
//! corresponding actions with bounded retries and rate-limit-friendly
//! pacing.

pub mod accounts;
pub mod api;
pub mod config;
pub mod engine;
pub mod scheduler;
pub mod types;

// Re-export main types for convenience
pub use types::{Account, BoxRecord, BoxState, CycleReport};
