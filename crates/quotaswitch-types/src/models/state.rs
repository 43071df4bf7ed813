//! Persisted runtime state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::config::RouterConfig;
use super::usage::AccountUsage;

/// The single process-wide mutable record.
///
/// Created empty on first run, loaded and persisted on every call.
/// Field names match the on-disk JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RuntimeState {
    /// Name of the account serving calls, if one has been chosen
    #[serde(
        rename = "currentAccount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_account: Option<String>,
    /// Usage snapshot per account name
    #[serde(default)]
    pub usage: HashMap<String, AccountUsage>,
    /// Total calls routed by this state file
    #[serde(rename = "requestCount", default)]
    pub request_count: u64,
    /// When primary recovery was last evaluated (epoch milliseconds)
    #[serde(
        rename = "lastPrimaryCheck",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_primary_check: Option<i64>,
    /// User configuration
    #[serde(default)]
    pub config: RouterConfig,
}

impl RuntimeState {
    pub fn usage_for(&self, name: &str) -> Option<&AccountUsage> {
        self.usage.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state_deserializes() {
        let state: RuntimeState = serde_json::from_str("{}").unwrap();
        assert!(state.current_account.is_none());
        assert_eq!(state.request_count, 0);
        assert!(state.usage.is_empty());
    }

    #[test]
    fn test_wire_field_names() {
        let state: RuntimeState = serde_json::from_str(
            r#"{
                "currentAccount": "backup",
                "usage": {"backup": {"session5h": {"utilization": 0.4, "reset": 1700000000, "status": "allowed"}}},
                "requestCount": 12,
                "lastPrimaryCheck": 1700000000000,
                "config": {"threshold": 0.7, "checkInterval": 3600000}
            }"#,
        )
        .unwrap();
        assert_eq!(state.current_account.as_deref(), Some("backup"));
        assert_eq!(state.request_count, 12);
        assert_eq!(state.last_primary_check, Some(1_700_000_000_000));
        let usage = state.usage_for("backup").unwrap();
        assert_eq!(usage.session5h.utilization, 0.4);
        assert_eq!(usage.session5h.reset, Some(1_700_000_000));
    }
}
