//! Account model.

use serde::{Deserialize, Serialize};

/// A credential set for the upstream service.
///
/// The persisted account list is ordered: index 0 is the primary, indices
/// 1..n are fallbacks in preference order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    /// Unique, stable key for the account
    pub name: String,
    /// OAuth access token
    pub access: String,
    /// OAuth refresh token for renewing access
    pub refresh: String,
    /// Absolute expiry of the access token (epoch milliseconds)
    pub expires: i64,
}

impl Account {
    /// Create a new account.
    pub fn new(
        name: impl Into<String>,
        access: impl Into<String>,
        refresh: impl Into<String>,
        expires: i64,
    ) -> Self {
        Self {
            name: name.into(),
            access: access.into(),
            refresh: refresh.into(),
            expires,
        }
    }

    /// Check if the access token is expired at `now_ms`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires
    }

    /// Check if the access token is expired now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp_millis())
    }

    /// Check whether the account has a usable access credential at `now_ms`.
    pub fn has_valid_access(&self, now_ms: i64) -> bool {
        !self.access.is_empty() && !self.is_expired_at(now_ms)
    }

    /// Replace the credentials after a refresh exchange.
    ///
    /// `expires_in` is the relative validity in seconds reported by the
    /// token endpoint, anchored at `now_ms`.
    pub fn apply_refresh(&mut self, access: String, refresh: String, expires_in: i64, now_ms: i64) {
        self.access = access;
        self.refresh = refresh;
        self.expires = now_ms.saturating_add(expires_in.saturating_mul(1000));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_check() {
        let account = Account::new("work", "at", "rt", 10_000);
        assert!(!account.is_expired_at(9_999));
        assert!(account.is_expired_at(10_000));
        assert!(!account.has_valid_access(5_000));
        assert!(!account.has_valid_access(20_000));
    }

    #[test]
    fn test_apply_refresh_anchors_expiry() {
        let mut account = Account::new("work", "", "rt-old", 0);
        account.apply_refresh("at-new".into(), "rt-new".into(), 3600, 1_000_000);
        assert_eq!(account.access, "at-new");
        assert_eq!(account.refresh, "rt-new");
        assert_eq!(account.expires, 1_000_000 + 3600 * 1000);
        assert!(account.has_valid_access(1_000_001));
    }
}
