//! Usage metric models.
//!
//! The upstream service reports quota consumption over three rolling
//! windows per account. Utilization is the fraction of the window already
//! consumed (0.0-1.0), not the remaining budget.

use serde::{Deserialize, Serialize};

/// The three rate-limit windows reported by the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Short rolling window (5 hours)
    Session5h,
    /// Long rolling window, all models (7 days)
    Weekly7d,
    /// Long rolling window, Sonnet-class models only (7 days)
    Weekly7dSonnet,
}

impl MetricKind {
    /// All metric kinds, in wire order.
    pub const ALL: [MetricKind; 3] = [
        MetricKind::Session5h,
        MetricKind::Weekly7d,
        MetricKind::Weekly7dSonnet,
    ];

    /// Wire key used in persisted state and telemetry header prefixes.
    pub const fn wire_key(self) -> &'static str {
        match self {
            MetricKind::Session5h => "session5h",
            MetricKind::Weekly7d => "weekly7d",
            MetricKind::Weekly7dSonnet => "weekly7dSonnet",
        }
    }
}

/// Status token reported per metric.
///
/// Anything other than the literal `allowed` is preserved verbatim so an
/// unknown upstream token survives a save/load round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetricStatus {
    Allowed,
    Other(String),
}

impl Default for MetricStatus {
    fn default() -> Self {
        MetricStatus::Allowed
    }
}

impl From<String> for MetricStatus {
    fn from(s: String) -> Self {
        if s == "allowed" {
            MetricStatus::Allowed
        } else {
            MetricStatus::Other(s)
        }
    }
}

impl From<MetricStatus> for String {
    fn from(status: MetricStatus) -> Self {
        match status {
            MetricStatus::Allowed => "allowed".to_string(),
            MetricStatus::Other(s) => s,
        }
    }
}

impl MetricStatus {
    pub fn is_allowed(&self) -> bool {
        matches!(self, MetricStatus::Allowed)
    }
}

/// State of a single rate-limit window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricWindow {
    /// Fraction of the window consumed (0.0-1.0)
    #[serde(default)]
    pub utilization: f64,
    /// When the window rolls over (epoch seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset: Option<i64>,
    /// Upstream status token for this window
    #[serde(default)]
    pub status: MetricStatus,
}

impl MetricWindow {
    /// Check whether the window's reset instant has passed at `now_ms`.
    pub fn reset_has_passed(&self, now_ms: i64) -> bool {
        self.reset
            .is_some_and(|reset_secs| reset_secs.saturating_mul(1000) <= now_ms)
    }
}

/// Usage snapshot for one account, one entry per metric window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AccountUsage {
    #[serde(default)]
    pub session5h: MetricWindow,
    #[serde(default)]
    pub weekly7d: MetricWindow,
    #[serde(rename = "weekly7dSonnet", default)]
    pub weekly7d_sonnet: MetricWindow,
    /// When this snapshot was last observed (epoch milliseconds)
    #[serde(default)]
    pub timestamp: i64,
}

impl AccountUsage {
    pub fn metric(&self, kind: MetricKind) -> &MetricWindow {
        match kind {
            MetricKind::Session5h => &self.session5h,
            MetricKind::Weekly7d => &self.weekly7d,
            MetricKind::Weekly7dSonnet => &self.weekly7d_sonnet,
        }
    }

    pub fn metric_mut(&mut self, kind: MetricKind) -> &mut MetricWindow {
        match kind {
            MetricKind::Session5h => &mut self.session5h,
            MetricKind::Weekly7d => &mut self.weekly7d,
            MetricKind::Weekly7dSonnet => &mut self.weekly7d_sonnet,
        }
    }
}

/// Telemetry for one metric from a single response.
///
/// `None` fields were absent (or unparsable) in the response and must not
/// disturb the stored value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricObservation {
    pub utilization: Option<f64>,
    pub reset: Option<i64>,
    pub status: Option<MetricStatus>,
}

impl MetricObservation {
    /// True when the response carried no data at all for this metric.
    pub fn is_empty(&self) -> bool {
        self.utilization.is_none() && self.reset.is_none() && self.status.is_none()
    }
}

/// Telemetry for all three metrics from a single response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UsageObservation {
    pub session5h: MetricObservation,
    pub weekly7d: MetricObservation,
    pub weekly7d_sonnet: MetricObservation,
}

impl UsageObservation {
    pub fn metric(&self, kind: MetricKind) -> &MetricObservation {
        match kind {
            MetricKind::Session5h => &self.session5h,
            MetricKind::Weekly7d => &self.weekly7d,
            MetricKind::Weekly7dSonnet => &self.weekly7d_sonnet,
        }
    }

    pub fn metric_mut(&mut self, kind: MetricKind) -> &mut MetricObservation {
        match kind {
            MetricKind::Session5h => &mut self.session5h,
            MetricKind::Weekly7d => &mut self.weekly7d,
            MetricKind::Weekly7dSonnet => &mut self.weekly7d_sonnet,
        }
    }

    /// True when no metric carried any data.
    pub fn is_empty(&self) -> bool {
        MetricKind::ALL.iter().all(|&k| self.metric(k).is_empty())
    }
}
