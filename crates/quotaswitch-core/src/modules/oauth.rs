//! Credential refresh exchange.
//!
//! Exchanges an account's refresh token for a fresh access token. Refresh
//! tokens are single-use upstream, so callers must persist the account
//! list immediately after a successful rotation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use quotaswitch_types::Account;

use crate::modules::logger;

/// Production token endpoint.
pub const TOKEN_ENDPOINT: &str = "https://console.anthropic.com/v1/oauth/token";
/// Fixed OAuth client identifier for this application.
const CLIENT_ID: &str = "9d1c250a-e61b-44d9-88ed-5944d1962f5e";

const REFRESH_TIMEOUT_SECS: u64 = 30;

/// A failed refresh exchange, carrying the HTTP status when one was
/// received (network failures have none).
#[derive(Debug)]
pub struct RefreshError {
    pub status: Option<u16>,
    pub message: String,
}

impl std::fmt::Display for RefreshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(code) => write!(f, "{} (HTTP {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
    client_id: &'static str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
}

/// Make sure the account's access credential is valid, refreshing it if
/// needed. Returns whether the credentials changed.
pub async fn ensure_fresh(account: &mut Account) -> Result<bool, RefreshError> {
    ensure_fresh_at(
        TOKEN_ENDPOINT,
        account,
        chrono::Utc::now().timestamp_millis(),
    )
    .await
}

/// [`ensure_fresh`] against an explicit endpoint and instant (tests).
pub async fn ensure_fresh_at(
    endpoint: &str,
    account: &mut Account,
    now_ms: i64,
) -> Result<bool, RefreshError> {
    if account.has_valid_access(now_ms) {
        return Ok(false);
    }

    if account.refresh.is_empty() {
        return Err(RefreshError {
            status: None,
            message: format!("Account {} has no refresh credential", account.name),
        });
    }

    logger::log_info(&format!("Refreshing credentials for {}", account.name));
    let response = refresh_exchange(endpoint, &account.refresh).await?;
    account.apply_refresh(
        response.access_token,
        response.refresh_token,
        response.expires_in,
        now_ms,
    );
    Ok(true)
}

async fn refresh_exchange(
    endpoint: &str,
    refresh_token: &str,
) -> Result<RefreshResponse, RefreshError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(REFRESH_TIMEOUT_SECS))
        .build()
        .map_err(|e| RefreshError {
            status: None,
            message: format!("HTTP client build failed: {}", e),
        })?;

    let result = client
        .post(endpoint)
        .json(&RefreshRequest {
            grant_type: "refresh_token",
            refresh_token,
            client_id: CLIENT_ID,
        })
        .send()
        .await
        .map_err(|e| RefreshError {
            status: None,
            message: format!("Refresh request failed: {}", e),
        })?;

    let status = result.status();
    if !status.is_success() {
        let body = result.text().await.unwrap_or_default();
        return Err(RefreshError {
            status: Some(status.as_u16()),
            message: format!("Token endpoint rejected refresh: {}", body),
        });
    }

    result.json().await.map_err(|e| RefreshError {
        status: None,
        message: format!("Malformed token response: {}", e),
    })
}
