//! Per-account decision engine.
//!
//! Control flow: supervisor -> cycle controller -> (classifier, mission
//! resolver) -> API client. Everything is strictly sequential per account;
//! the cycle controller owns the no-concurrent-mutations invariant.

pub mod classifier;
pub mod cycle;
pub mod missions;
pub mod supervisor;

pub use classifier::classify;
pub use cycle::AccountCycle;
pub use missions::{MissionResolver, Resolution};
pub use supervisor::Supervisor;
