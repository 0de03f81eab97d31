//! Remote game API surface.
//!
//! The `BoxApi` trait is the formal contract between the decision engine and
//! the remote system; the engine only ever discriminates failures through the
//! typed `ApiError` taxonomy, never through message text. The HTTP
//! implementation lives in [`http`], request pacing in [`pacer`].

pub mod http;
pub mod pacer;

use crate::types::{Account, BoxRecord, ClaimReceipt, MissionOutcome, StartReceipt};
use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpBoxApi;
pub use pacer::RequestPacer;

/// Typed failure taxonomy for API calls. Recognized application-level
/// sentinels get their own variants so callers can run recovery logic
/// without inspecting response bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable response from the remote; always retryable at the
    /// supervisor level.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// HTTP 401 or a session response without a user; the cookie is
    /// presumed expired and the account is skipped for the cycle.
    #[error("session rejected by the remote")]
    AuthInvalid,

    /// The remote reports an existing active mining session.
    #[error("an active mining session already exists")]
    AlreadyMining,

    /// The remote reports unmet mission prerequisites for a claim.
    #[error("mission prerequisites are not completed")]
    MissionRequired,

    /// Any other application-level failure; logged with a body excerpt and
    /// contained at the box level.
    #[error("unrecognized API failure (HTTP {status}): {message}")]
    Unrecognized { status: u16, message: String },
}

/// Authenticated calls against the remote game API.
///
/// Implementations must not be invoked concurrently for the same account:
/// the cycle controller awaits every call to completion before issuing the
/// next one, and every call consumes one unit of the fixed inter-request
/// delay budget.
#[async_trait]
pub trait BoxApi: Send + Sync {
    /// Lightweight session check. Returns `Ok(false)` (not an error) when
    /// the remote rejects the cookie with 401 or omits the session user.
    async fn validate_session(&self, account: &Account) -> Result<bool, ApiError>;

    /// Fetch all boxes regardless of state, in the remote's listing order.
    async fn list_boxes(&self, account: &Account) -> Result<Vec<BoxRecord>, ApiError>;

    /// Authoritative single-box snapshot. Must be fetched immediately
    /// before any decision about the box; list-level data may be stale.
    async fn box_detail(&self, account: &Account, box_id: &str) -> Result<BoxRecord, ApiError>;

    /// Start mining a box. Fails with [`ApiError::AlreadyMining`] when the
    /// remote signals an existing active mining session.
    async fn start_mining(&self, account: &Account, box_id: &str)
        -> Result<StartReceipt, ApiError>;

    /// Claim a ready box. Fails with [`ApiError::MissionRequired`] when the
    /// remote signals unmet mission prerequisites.
    async fn claim(&self, account: &Account, box_id: &str) -> Result<ClaimReceipt, ApiError>;

    /// Complete one mission prerequisite. A remote "already done / already
    /// verified" response resolves to
    /// [`MissionOutcome::AlreadyCompleted`], not an error.
    async fn complete_mission(
        &self,
        account: &Account,
        box_id: &str,
        mission_url: &str,
    ) -> Result<MissionOutcome, ApiError>;
}
