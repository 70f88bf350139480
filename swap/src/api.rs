//! REST client for the maker's swap endpoints
//!
//! Thin typed wrapper over `reqwest`. Every error path is reduced to a
//! displayable message before it leaves this module.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Maker call failures
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request never produced an HTTP response
    #[error("maker unreachable: {0}")]
    Transport(String),
    /// Maker answered with a non-success status
    #[error("maker rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Swap initialization payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitSwapRequest {
    pub from_amount: u64,
    pub from_asset: String,
    pub to_amount: u64,
    pub to_asset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rfq_id: Option<String>,
}

/// Swap initialization response
#[derive(Debug, Clone, Deserialize)]
pub struct InitSwapResponse {
    pub swapstring: String,
    pub payment_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhitelistRequest {
    pub swapstring: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteSwapRequest {
    pub payment_hash: String,
    pub swapstring: String,
    pub taker_pubkey: String,
}

/// HTTP client bound to one maker base URL
#[derive(Debug, Clone)]
pub struct MakerClient {
    http: reqwest::Client,
    base_url: String,
}

impl MakerClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: common::ServiceEndpoints::normalize(base_url),
        }
    }

    /// Phase 1: request swap terms
    pub async fn init_swap(&self, request: &InitSwapRequest) -> Result<InitSwapResponse, ApiError> {
        self.post_json("api/v1/swaps/init", request).await
    }

    /// Phase 2: whitelist the descriptor
    pub async fn whitelist(&self, request: &WhitelistRequest) -> Result<Value, ApiError> {
        self.post_json("api/v1/swaps/whitelist", request).await
    }

    /// Phase 3: execute the swap
    pub async fn execute_swap(&self, request: &ExecuteSwapRequest) -> Result<Value, ApiError> {
        self.post_json("api/v1/swaps/execute", request).await
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "maker request");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: extract_error_message(&text),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))
    }
}

/// Pull a human-readable message out of a maker error body
///
/// Preference order: `detail` field, `error` field, the whole JSON payload,
/// the raw body text.
#[must_use]
pub fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "error"] {
            if let Some(message) = value.get(key).and_then(Value::as_str) {
                return message.to_string();
            }
        }
        return value.to_string();
    }
    if body.trim().is_empty() {
        "Request failed".to_string()
    } else {
        body.to_string()
    }
}
