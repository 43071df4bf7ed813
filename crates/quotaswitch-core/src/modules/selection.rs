//! Account selection.
//!
//! A two-state hysteresis machine decides which account serves the next
//! call. On the primary, any metric utilization strictly above its
//! threshold triggers failover to the first non-breaching fallback (in
//! caller preference order). On a fallback, the machine stays put until a
//! recovery check fires: either the primary's earliest quota reset has
//! passed since the last check, or the configured check interval has
//! elapsed. Checks are rationed this way so a single low reading between
//! checks cannot bounce traffic back and forth.

use quotaswitch_types::{Account, AccountUsage, MetricKind, RuntimeState, Thresholds};

use crate::error::{AppError, AppResult};
use crate::modules::logger;

/// True when any metric's utilization is strictly above its threshold.
pub fn is_over_threshold(usage: Option<&AccountUsage>, thresholds: &Thresholds) -> bool {
    let Some(usage) = usage else {
        return false;
    };
    MetricKind::ALL
        .iter()
        .any(|&kind| usage.metric(kind).utilization > thresholds.metric(kind))
}

/// Utilization normalized by its own threshold, maxed over metrics.
///
/// Ranks fallbacks when every one of them breaches: an account close to a
/// tight threshold scores worse than one equally close to a loose one.
pub fn pressure(usage: Option<&AccountUsage>, thresholds: &Thresholds) -> f64 {
    let Some(usage) = usage else {
        return 0.0;
    };
    MetricKind::ALL
        .iter()
        .map(|&kind| {
            let utilization = usage.metric(kind).utilization;
            let threshold = thresholds.metric(kind);
            if threshold > 0.0 {
                utilization / threshold
            } else if utilization > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        })
        .fold(0.0, f64::max)
}

/// Earliest reset instant across an account's metrics (epoch ms).
fn earliest_reset_ms(usage: Option<&AccountUsage>) -> Option<i64> {
    let usage = usage?;
    MetricKind::ALL
        .iter()
        .filter_map(|&kind| usage.metric(kind).reset)
        .map(|secs| secs.saturating_mul(1000))
        .min()
}

/// Pick the account for the next call, using the wall clock.
pub fn select<'a>(accounts: &'a [Account], state: &mut RuntimeState) -> AppResult<&'a Account> {
    select_at(accounts, state, chrono::Utc::now().timestamp_millis())
}

/// Pick the account for the next call at an explicit instant.
///
/// Updates `state.current_account` (and `state.last_primary_check` when a
/// failover or recovery check happens); the caller persists the state.
pub fn select_at<'a>(
    accounts: &'a [Account],
    state: &mut RuntimeState,
    now_ms: i64,
) -> AppResult<&'a Account> {
    if accounts.is_empty() {
        return Err(AppError::Config("No accounts configured".to_string()));
    }
    if accounts.len() == 1 {
        state.current_account = Some(accounts[0].name.clone());
        return Ok(&accounts[0]);
    }

    let thresholds = state.config.thresholds();

    // Resolve the recorded active account. A cold start begins on the
    // primary; a stale name resolves to the first fallback rather than
    // failing the call.
    let active_idx = match &state.current_account {
        None => 0,
        Some(name) => match accounts.iter().position(|a| &a.name == name) {
            Some(idx) => idx,
            None => {
                logger::log_warn(&format!(
                    "Active account {:?} no longer exists, using first fallback",
                    name
                ));
                1
            }
        },
    };

    let chosen = if active_idx == 0 {
        select_from_primary(accounts, state, &thresholds, now_ms)
    } else {
        select_from_fallback(accounts, state, &thresholds, active_idx, now_ms)
    };

    if state.current_account.as_deref() != Some(chosen.name.as_str()) {
        logger::log_info(&format!(
            "Routing to account {} (was {:?})",
            chosen.name,
            state.current_account.as_deref().unwrap_or("<none>")
        ));
    }
    state.current_account = Some(chosen.name.clone());
    Ok(chosen)
}

fn select_from_primary<'a>(
    accounts: &'a [Account],
    state: &mut RuntimeState,
    thresholds: &Thresholds,
    now_ms: i64,
) -> &'a Account {
    let primary = &accounts[0];
    if !is_over_threshold(state.usage_for(&primary.name), thresholds) {
        return primary;
    }

    let fallbacks = &accounts[1..];
    let chosen = fallbacks
        .iter()
        .find(|a| !is_over_threshold(state.usage_for(&a.name), thresholds))
        .unwrap_or_else(|| lowest_pressure(fallbacks, state, thresholds));

    if chosen.name != primary.name {
        state.last_primary_check = Some(now_ms);
    }
    chosen
}

/// All fallbacks breach: take the one with the lowest pressure.
/// Preference order breaks exact ties.
fn lowest_pressure<'a>(
    fallbacks: &'a [Account],
    state: &RuntimeState,
    thresholds: &Thresholds,
) -> &'a Account {
    let mut best = &fallbacks[0];
    let mut best_pressure = pressure(state.usage_for(&best.name), thresholds);
    for account in &fallbacks[1..] {
        let p = pressure(state.usage_for(&account.name), thresholds);
        if p < best_pressure {
            best = account;
            best_pressure = p;
        }
    }
    best
}

fn select_from_fallback<'a>(
    accounts: &'a [Account],
    state: &mut RuntimeState,
    thresholds: &Thresholds,
    active_idx: usize,
    now_ms: i64,
) -> &'a Account {
    let primary = &accounts[0];
    let active = &accounts[active_idx];
    let primary_recovered = !is_over_threshold(state.usage_for(&primary.name), thresholds);

    let reset_due = match (
        earliest_reset_ms(state.usage_for(&primary.name)),
        state.last_primary_check,
    ) {
        (Some(reset_ms), Some(last_check)) => reset_ms > last_check && reset_ms <= now_ms,
        (Some(reset_ms), None) => reset_ms <= now_ms,
        (None, _) => false,
    };
    let interval_due = match state.last_primary_check {
        Some(last_check) => now_ms.saturating_sub(last_check) >= state.config.check_interval_ms,
        None => true,
    };

    if reset_due || interval_due {
        state.last_primary_check = Some(now_ms);
        if primary_recovered {
            logger::log_info(&format!("Primary {} recovered, switching back", primary.name));
            return primary;
        }
    }

    // Between checks, stay put unconditionally.
    active
}
