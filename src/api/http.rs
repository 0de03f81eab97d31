//! reqwest-backed implementation of the `BoxApi` contract.
//!
//! All error discrimination happens here: the JSON error body is parsed and
//! its `message`/`error` field is matched against the remote's known
//! sentinel phrases, so the engine above only ever sees `ApiError` variants.

use crate::api::{ApiError, BoxApi, RequestPacer};
use crate::config::Config;
use crate::types::{Account, BoxRecord, ClaimReceipt, MissionOutcome, StartReceipt};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Remote phrase signalling an existing active mining session.
const ALREADY_MINING_SENTINEL: &str = "already have an active box mining";
/// Remote phrase signalling unmet mission prerequisites on claim.
const MISSION_REQUIRED_SENTINEL: &str = "Mission not completed yet";
/// Remote phrases signalling a mission that is already satisfied.
const MISSION_DONE_SENTINELS: [&str; 2] = ["Quest already done", "already verified"];

const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
];

#[derive(Debug, Deserialize)]
struct SessionResponse {
    user: Option<SessionUser>,
}

#[derive(Debug, Deserialize)]
struct SessionUser {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BoxListResponse {
    #[serde(default)]
    boxes: Vec<BoxRecord>,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "box")]
    started: StartedBox,
}

#[derive(Debug, Deserialize)]
struct StartedBox {
    #[serde(rename = "readyAt", default)]
    ready_at: Option<DateTime<Utc>>,
    #[serde(rename = "prizeAmount", default)]
    prize_amount: Option<f64>,
    #[serde(rename = "prizeType", default)]
    prize_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaimResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "prizeAmount", default)]
    prize_amount: Option<f64>,
    #[serde(rename = "prizeType", default)]
    prize_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MissionResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Structured error body returned by the remote on application failures.
#[derive(Debug, Deserialize)]
struct ApiFailure {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the remote game API. One instance serves all accounts;
/// the per-account credential rides on each request as a Cookie header.
pub struct HttpBoxApi {
    client: Client,
    base_url: String,
    pacer: RequestPacer,
}

impl HttpBoxApi {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            header::REFERER,
            header::HeaderValue::from_static("https://www.goblin.meme/"),
        );

        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let client = Client::builder()
            .timeout(Duration::from_millis(config.api.timeout_ms))
            .default_headers(headers)
            .user_agent(user_agent)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            pacer: RequestPacer::new(config.request_delay()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, account: &Account, path: &str) -> Result<Response, ApiError> {
        self.pacer.acquire().await;
        debug!("[{}] GET {}", account.name, path);
        let response = self
            .client
            .get(self.url(path))
            .header(header::COOKIE, &account.cookie)
            .send()
            .await?;
        Ok(response)
    }

    async fn post(
        &self,
        account: &Account,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response, ApiError> {
        self.pacer.acquire().await;
        debug!("[{}] POST {}", account.name, path);
        let mut request = self
            .client
            .post(self.url(path))
            .header(header::COOKIE, &account.cookie);
        request = match body {
            Some(json) => request.json(&json),
            None => request.header(header::CONTENT_LENGTH, "0"),
        };
        let response = request.send().await?;
        Ok(response)
    }

    /// Extract the structured failure message from an error response,
    /// falling back to a body excerpt when the body is not the expected
    /// JSON shape.
    async fn failure_message(response: Response) -> (StatusCode, String) {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiFailure>(&body)
            .ok()
            .and_then(|failure| failure.message.or(failure.error))
            .unwrap_or_else(|| excerpt(&body));
        (status, message)
    }

    async fn unrecognized(response: Response) -> ApiError {
        let (status, message) = Self::failure_message(response).await;
        if status == StatusCode::UNAUTHORIZED {
            return ApiError::AuthInvalid;
        }
        ApiError::Unrecognized {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl BoxApi for HttpBoxApi {
    async fn validate_session(&self, account: &Account) -> Result<bool, ApiError> {
        let response = self.get(account, "/auth/session").await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("[{}] session cookie rejected (401)", account.name);
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(Self::unrecognized(response).await);
        }
        let session: SessionResponse = response.json().await?;
        match session.user {
            Some(user) => {
                info!(
                    "[{}] session valid for user '{}'",
                    account.name,
                    user.name.as_deref().unwrap_or("unknown")
                );
                Ok(true)
            }
            None => {
                warn!("[{}] session response carries no user", account.name);
                Ok(false)
            }
        }
    }

    async fn list_boxes(&self, account: &Account) -> Result<Vec<BoxRecord>, ApiError> {
        let response = self.get(account, "/box").await?;
        if !response.status().is_success() {
            return Err(Self::unrecognized(response).await);
        }
        let listing: BoxListResponse = response.json().await?;
        info!("[{}] fetched {} box(es)", account.name, listing.boxes.len());
        Ok(listing.boxes)
    }

    async fn box_detail(&self, account: &Account, box_id: &str) -> Result<BoxRecord, ApiError> {
        let response = self.get(account, &format!("/box/{box_id}")).await?;
        if !response.status().is_success() {
            return Err(Self::unrecognized(response).await);
        }
        let detail: BoxRecord = response.json().await?;
        debug!("[{}] box detail {:?}", account.name, detail);
        Ok(detail)
    }

    async fn start_mining(
        &self,
        account: &Account,
        box_id: &str,
    ) -> Result<StartReceipt, ApiError> {
        let response = self.post(account, &format!("/box/{box_id}/start"), None).await?;
        if !response.status().is_success() {
            let (status, message) = Self::failure_message(response).await;
            if status == StatusCode::UNAUTHORIZED {
                return Err(ApiError::AuthInvalid);
            }
            if message.contains(ALREADY_MINING_SENTINEL) {
                return Err(ApiError::AlreadyMining);
            }
            return Err(ApiError::Unrecognized {
                status: status.as_u16(),
                message,
            });
        }
        let started: StartResponse = response.json().await?;
        if let Some(message) = &started.message {
            debug!("[{}] start response: {}", account.name, message);
        }
        Ok(StartReceipt {
            ready_at: started.started.ready_at,
            prize_amount: started.started.prize_amount,
            prize_type: started.started.prize_type,
        })
    }

    async fn claim(&self, account: &Account, box_id: &str) -> Result<ClaimReceipt, ApiError> {
        let response = self.post(account, &format!("/box/{box_id}/claim"), None).await?;
        if !response.status().is_success() {
            let (status, message) = Self::failure_message(response).await;
            if status == StatusCode::UNAUTHORIZED {
                return Err(ApiError::AuthInvalid);
            }
            if message.contains(MISSION_REQUIRED_SENTINEL) {
                return Err(ApiError::MissionRequired);
            }
            return Err(ApiError::Unrecognized {
                status: status.as_u16(),
                message,
            });
        }
        let claimed: ClaimResponse = response.json().await?;
        if let Some(message) = &claimed.message {
            debug!("[{}] claim response: {}", account.name, message);
        }
        Ok(ClaimReceipt {
            prize_amount: claimed.prize_amount,
            prize_type: claimed.prize_type,
        })
    }

    async fn complete_mission(
        &self,
        account: &Account,
        box_id: &str,
        mission_url: &str,
    ) -> Result<MissionOutcome, ApiError> {
        let body = serde_json::json!({ "url": mission_url });
        let response = self
            .post(account, &format!("/box/{box_id}/mission"), Some(body))
            .await?;
        if !response.status().is_success() {
            let (status, message) = Self::failure_message(response).await;
            if status == StatusCode::UNAUTHORIZED {
                return Err(ApiError::AuthInvalid);
            }
            if MISSION_DONE_SENTINELS
                .iter()
                .any(|sentinel| message.contains(sentinel))
            {
                debug!(
                    "[{}] mission {} already satisfied: {}",
                    account.name, mission_url, message
                );
                return Ok(MissionOutcome::AlreadyCompleted);
            }
            return Err(ApiError::Unrecognized {
                status: status.as_u16(),
                message,
            });
        }
        let mission: MissionResponse = response.json().await?;
        if let Some(message) = &mission.message {
            debug!("[{}] mission response: {}", account.name, message);
        }
        Ok(MissionOutcome::Completed)
    }
}

/// Bounded body excerpt for log lines and unrecognized errors.
fn excerpt(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.len() <= MAX {
        trimmed.to_string()
    } else {
        let mut end = MAX;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);
        let cut = excerpt(&long);
        assert!(cut.len() <= 203);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_failure_body_prefers_message_field() {
        let failure: ApiFailure =
            serde_json::from_str(r#"{"message": "Mission not completed yet.", "error": "other"}"#)
                .unwrap();
        assert_eq!(
            failure.message.or(failure.error).unwrap(),
            "Mission not completed yet."
        );
    }

    #[test]
    fn test_box_list_tolerates_missing_boxes_field() {
        let listing: BoxListResponse = serde_json::from_str("{}").unwrap();
        assert!(listing.boxes.is_empty());
    }

    #[test]
    fn test_box_record_wire_shape() {
        let raw = r#"{
            "_id": "abc123",
            "name": "The Mich Khan",
            "active": true,
            "startTime": null,
            "isReady": false,
            "opened": false,
            "readyAt": null,
            "missionUrl": "https://a.example,https://b.example"
        }"#;
        let record: BoxRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.name, "The Mich Khan");
        assert!(record.active);
        assert!(record.start_time.is_none());
        assert_eq!(
            record.mission_url.as_deref(),
            Some("https://a.example,https://b.example")
        );
    }
}
