//! Per-account usage tracking.
//!
//! Consumes rate-limit telemetry from response headers and keeps the
//! persisted usage map consistent with the account list. Absence of a
//! metric in one response never means "reset to zero": some windows (the
//! Sonnet weekly window in particular) only appear on requests that
//! exercise them.

use quotaswitch_types::{
    Account, AccountUsage, MetricKind, MetricStatus, RuntimeState, UsageObservation,
};

use crate::modules::logger;

/// Bring `state.usage` in line with the known accounts and clear metrics
/// whose quota window has rolled over.
///
/// Returns whether anything changed so callers can skip a redundant
/// persist and re-run selection when the active account's eligibility
/// may have shifted.
pub fn reconcile(accounts: &[Account], state: &mut RuntimeState, now_ms: i64) -> bool {
    let mut changed = false;

    for account in accounts {
        if !state.usage.contains_key(&account.name) {
            state
                .usage
                .insert(account.name.clone(), AccountUsage::default());
            changed = true;
        }
    }

    for (name, usage) in state.usage.iter_mut() {
        for kind in MetricKind::ALL {
            let window = usage.metric_mut(kind);
            if window.utilization != 0.0 && window.reset_has_passed(now_ms) {
                logger::log_info(&format!(
                    "Quota window {} for {} has rolled over, clearing",
                    kind.wire_key(),
                    name
                ));
                window.utilization = 0.0;
                window.status = MetricStatus::Allowed;
                changed = true;
            }
        }
    }

    changed
}

/// Apply one response's telemetry to an account's usage snapshot.
///
/// Metrics wholly absent from the observation keep their prior value;
/// within a present metric, only the present fields are applied. The
/// snapshot timestamp always advances to the observation time.
pub fn update_from_observation(
    state: &mut RuntimeState,
    account_name: &str,
    observation: &UsageObservation,
    now_ms: i64,
) {
    let usage = state
        .usage
        .entry(account_name.to_string())
        .or_insert_with(AccountUsage::default);

    for kind in MetricKind::ALL {
        let observed = observation.metric(kind);
        if observed.is_empty() {
            continue;
        }
        let window = usage.metric_mut(kind);
        if let Some(utilization) = observed.utilization {
            window.utilization = utilization;
        }
        if let Some(reset) = observed.reset {
            window.reset = Some(reset);
        }
        if let Some(status) = &observed.status {
            window.status = status.clone();
        }
    }

    usage.timestamp = now_ms;
}

/// Parse header-style key/value pairs into a [`UsageObservation`].
///
/// Keys are `<metric>-utilization` (0-1 float), `<metric>-reset`
/// (epoch seconds), `<metric>-status` (token). Malformed numeric values
/// are treated as absent, never an error.
pub fn parse_observation<'a, I>(pairs: I) -> UsageObservation
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut observation = UsageObservation::default();

    for (key, value) in pairs {
        for kind in MetricKind::ALL {
            let prefix = kind.wire_key();
            let Some(field) = key
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('-'))
            else {
                continue;
            };

            let observed = observation.metric_mut(kind);
            match field {
                "utilization" => match value.trim().parse::<f64>() {
                    Ok(v) => observed.utilization = Some(v),
                    Err(_) => {
                        logger::log_warn(&format!("Malformed {}-utilization: {:?}", prefix, value));
                    }
                },
                "reset" => match value.trim().parse::<i64>() {
                    Ok(v) => observed.reset = Some(v),
                    Err(_) => {
                        logger::log_warn(&format!("Malformed {}-reset: {:?}", prefix, value));
                    }
                },
                "status" => observed.status = Some(MetricStatus::from(value.to_string())),
                _ => {}
            }
        }
    }

    observation
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotaswitch_types::MetricObservation;

    fn account(name: &str) -> Account {
        Account::new(name, "at", "rt", i64::MAX)
    }

    #[test]
    fn test_reconcile_inserts_zeroed_usage() {
        let accounts = vec![account("primary"), account("backup")];
        let mut state = RuntimeState::default();

        assert!(reconcile(&accounts, &mut state, 0));
        let usage = state.usage_for("backup").unwrap();
        assert_eq!(usage.session5h.utilization, 0.0);
        assert!(usage.session5h.status.is_allowed());

        // Second pass is a no-op.
        assert!(!reconcile(&accounts, &mut state, 0));
    }

    #[test]
    fn test_reconcile_clears_stale_metric() {
        let accounts = vec![account("primary")];
        let mut state = RuntimeState::default();
        reconcile(&accounts, &mut state, 0);

        let now_ms = 2_000_000;
        {
            let usage = state.usage.get_mut("primary").unwrap();
            usage.session5h.utilization = 0.9;
            usage.session5h.reset = Some(now_ms / 1000 - 1);
            usage.session5h.status = MetricStatus::Other("rejected".to_string());
        }

        assert!(reconcile(&accounts, &mut state, now_ms));
        let window = &state.usage_for("primary").unwrap().session5h;
        assert_eq!(window.utilization, 0.0);
        assert!(window.status.is_allowed());
    }

    #[test]
    fn test_reconcile_leaves_future_reset_alone() {
        let accounts = vec![account("primary")];
        let mut state = RuntimeState::default();
        reconcile(&accounts, &mut state, 0);

        let now_ms = 2_000_000;
        {
            let usage = state.usage.get_mut("primary").unwrap();
            usage.session5h.utilization = 0.9;
            usage.session5h.reset = Some(now_ms / 1000 + 3600);
        }

        assert!(!reconcile(&accounts, &mut state, now_ms));
        assert_eq!(state.usage_for("primary").unwrap().session5h.utilization, 0.9);
    }

    #[test]
    fn test_partial_observation_preserves_other_metrics() {
        let mut state = RuntimeState::default();
        reconcile(&[account("work")], &mut state, 0);
        {
            let usage = state.usage.get_mut("work").unwrap();
            usage.weekly7d.utilization = 0.5;
            usage.weekly7d.reset = Some(99);
            usage.weekly7d_sonnet.utilization = 0.3;
        }

        let observation = UsageObservation {
            session5h: MetricObservation {
                utilization: Some(0.8),
                ..Default::default()
            },
            ..Default::default()
        };
        update_from_observation(&mut state, "work", &observation, 1234);

        let usage = state.usage_for("work").unwrap();
        assert_eq!(usage.session5h.utilization, 0.8);
        assert_eq!(usage.weekly7d.utilization, 0.5);
        assert_eq!(usage.weekly7d.reset, Some(99));
        assert_eq!(usage.weekly7d_sonnet.utilization, 0.3);
        assert_eq!(usage.timestamp, 1234);
    }

    #[test]
    fn test_present_metric_keeps_absent_fields() {
        let mut state = RuntimeState::default();
        reconcile(&[account("work")], &mut state, 0);
        {
            let usage = state.usage.get_mut("work").unwrap();
            usage.session5h.reset = Some(777);
        }

        // Utilization arrives without a reset; the stored reset survives.
        let observation = UsageObservation {
            session5h: MetricObservation {
                utilization: Some(0.2),
                ..Default::default()
            },
            ..Default::default()
        };
        update_from_observation(&mut state, "work", &observation, 1);

        let window = &state.usage_for("work").unwrap().session5h;
        assert_eq!(window.utilization, 0.2);
        assert_eq!(window.reset, Some(777));
    }

    #[test]
    fn test_parse_observation_full_triple() {
        let headers = vec![
            ("session5h-utilization", "0.42"),
            ("session5h-reset", "1700000000"),
            ("session5h-status", "allowed"),
            ("weekly7dSonnet-utilization", "0.9"),
            ("x-request-id", "abc"),
        ];
        let observation = parse_observation(headers);

        assert_eq!(observation.session5h.utilization, Some(0.42));
        assert_eq!(observation.session5h.reset, Some(1_700_000_000));
        assert_eq!(observation.session5h.status, Some(MetricStatus::Allowed));
        assert_eq!(observation.weekly7d_sonnet.utilization, Some(0.9));
        assert!(observation.weekly7d.is_empty());
    }

    #[test]
    fn test_parse_observation_malformed_values_are_absent() {
        let headers = vec![
            ("session5h-utilization", "not-a-number"),
            ("session5h-reset", "soon"),
            ("weekly7d-status", "rejected"),
        ];
        let observation = parse_observation(headers);

        assert!(observation.session5h.is_empty());
        assert_eq!(
            observation.weekly7d.status,
            Some(MetricStatus::Other("rejected".to_string()))
        );
    }

    #[test]
    fn test_empty_observation_only_bumps_timestamp() {
        let mut state = RuntimeState::default();
        reconcile(&[account("work")], &mut state, 0);
        {
            let usage = state.usage.get_mut("work").unwrap();
            usage.session5h.utilization = 0.6;
        }

        update_from_observation(&mut state, "work", &UsageObservation::default(), 55);
        let usage = state.usage_for("work").unwrap();
        assert_eq!(usage.session5h.utilization, 0.6);
        assert_eq!(usage.timestamp, 55);
    }
}
