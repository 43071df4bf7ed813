//! Per-call orchestration.
//!
//! One call runs: load accounts + state → reconcile usage → select an
//! account → ensure its credential is fresh (failing over across the
//! remaining accounts) → caller dispatches the request → record the
//! response telemetry → persist. Storage write failures are logged and
//! absorbed; the in-memory state is not rolled back, so the next
//! successful write carries the update.

use quotaswitch_types::{Account, RuntimeState};

use crate::error::{AppError, AppResult};
use crate::modules::logger;
use crate::modules::storage::StorePaths;
use crate::modules::{account as account_store, oauth, selection, state_store, usage};

/// Everything the dispatch layer needs for one outbound call.
#[derive(Debug, Clone)]
pub struct PreparedCall {
    /// The account serving this call, with a valid access credential.
    pub account: Account,
    /// Runtime state as persisted; hand it back to
    /// [`Router::record_response`] after the call.
    pub state: RuntimeState,
}

/// Account selection and durable state for one upstream service.
pub struct Router {
    paths: StorePaths,
    token_endpoint: String,
}

impl Router {
    /// Router over the default storage locations.
    pub fn new() -> AppResult<Self> {
        Ok(Self::with_paths(StorePaths::resolve()?))
    }

    /// Router over explicit storage locations.
    pub fn with_paths(paths: StorePaths) -> Self {
        Self {
            paths,
            token_endpoint: oauth::TOKEN_ENDPOINT.to_string(),
        }
    }

    /// Override the token endpoint (tests, staging).
    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Prepare the next outbound call.
    pub async fn prepare(&self) -> AppResult<PreparedCall> {
        self.prepare_at(chrono::Utc::now().timestamp_millis()).await
    }

    /// [`Router::prepare`] at an explicit instant.
    pub async fn prepare_at(&self, now_ms: i64) -> AppResult<PreparedCall> {
        let mut accounts = account_store::load_accounts(&self.paths)?;
        let mut state = state_store::load_state(&self.paths);

        usage::reconcile(&accounts, &mut state, now_ms);

        let chosen_idx = {
            let chosen = selection::select_at(&accounts, &mut state, now_ms)?;
            accounts
                .iter()
                .position(|a| a.name == chosen.name)
                .unwrap_or(0)
        };

        let ready_idx = self
            .ensure_fresh_with_failover(&mut accounts, chosen_idx, now_ms)
            .await?;
        if ready_idx != chosen_idx {
            state.current_account = Some(accounts[ready_idx].name.clone());
        }

        state.request_count = state.request_count.saturating_add(1);
        if let Err(e) = state_store::save_state(&self.paths, &state) {
            logger::log_warn(&format!("State write failed, continuing in memory: {}", e));
        }

        Ok(PreparedCall {
            account: accounts[ready_idx].clone(),
            state,
        })
    }

    /// Refresh the preferred account, rotating through every other
    /// not-yet-attempted account on failure. The account list is
    /// persisted after each successful rotation because the old refresh
    /// token dies with the exchange.
    async fn ensure_fresh_with_failover(
        &self,
        accounts: &mut [Account],
        preferred_idx: usize,
        now_ms: i64,
    ) -> AppResult<usize> {
        let order = std::iter::once(preferred_idx)
            .chain((0..accounts.len()).filter(|&i| i != preferred_idx));

        let mut last_failure: Option<(String, oauth::RefreshError)> = None;

        for idx in order {
            let mut candidate = accounts[idx].clone();
            match oauth::ensure_fresh_at(&self.token_endpoint, &mut candidate, now_ms).await {
                Ok(changed) => {
                    if changed {
                        accounts[idx] = candidate;
                        if let Err(e) = account_store::save_accounts(&self.paths, accounts) {
                            logger::log_error(&format!(
                                "Account write failed after credential rotation: {}",
                                e
                            ));
                        }
                    }
                    return Ok(idx);
                }
                Err(e) => {
                    logger::log_warn(&format!(
                        "Credential refresh failed for {}: {}",
                        candidate.name, e
                    ));
                    last_failure = Some((candidate.name, e));
                }
            }
        }

        let Some((name, error)) = last_failure else {
            return Err(AppError::Account("No accounts to refresh".to_string()));
        };
        Err(AppError::OAuth(format!(
            "All {} account(s) failed to refresh; last tried {}: {}",
            accounts.len(),
            name,
            error
        )))
    }

    /// Record the response telemetry for the account that served the call
    /// and persist the state.
    pub fn record_response<'a, I>(
        &self,
        state: &mut RuntimeState,
        account_name: &str,
        headers: I,
        now_ms: i64,
    ) where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let observation = usage::parse_observation(headers);
        usage::update_from_observation(state, account_name, &observation, now_ms);
        if let Err(e) = state_store::save_state(&self.paths, state) {
            logger::log_warn(&format!("State write failed, continuing in memory: {}", e));
        }
    }
}
