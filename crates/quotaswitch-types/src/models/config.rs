//! Router configuration.

use serde::{Deserialize, Serialize};

use super::usage::MetricKind;

/// Default utilization threshold applied to every metric.
pub const DEFAULT_THRESHOLD: f64 = 0.70;

/// Default primary-recovery check interval (1 hour).
pub const DEFAULT_CHECK_INTERVAL_MS: i64 = 3_600_000;

/// Per-metric utilization thresholds, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub session5h: f64,
    pub weekly7d: f64,
    #[serde(rename = "weekly7dSonnet")]
    pub weekly7d_sonnet: f64,
}

impl Thresholds {
    /// Expand a single scalar to all three metrics.
    pub const fn uniform(value: f64) -> Self {
        Self {
            session5h: value,
            weekly7d: value,
            weekly7d_sonnet: value,
        }
    }

    pub const fn metric(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Session5h => self.session5h,
            MetricKind::Weekly7d => self.weekly7d,
            MetricKind::Weekly7dSonnet => self.weekly7d_sonnet,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::uniform(DEFAULT_THRESHOLD)
    }
}

/// Persisted threshold setting: a single scalar or a per-metric map.
///
/// The scalar form is kept as written so an existing state file
/// round-trips unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdSetting {
    Scalar(f64),
    PerMetric(Thresholds),
}

impl ThresholdSetting {
    /// Resolve to concrete per-metric thresholds.
    pub fn resolve(&self) -> Thresholds {
        match *self {
            ThresholdSetting::Scalar(v) => Thresholds::uniform(v),
            ThresholdSetting::PerMetric(t) => t,
        }
    }
}

impl Default for ThresholdSetting {
    fn default() -> Self {
        ThresholdSetting::Scalar(DEFAULT_THRESHOLD)
    }
}

/// User configuration for the selection engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Utilization threshold(s) above which an account is avoided
    #[serde(default)]
    pub threshold: ThresholdSetting,
    /// Minimum interval between primary-recovery checks (milliseconds)
    #[serde(rename = "checkInterval", default = "default_check_interval")]
    pub check_interval_ms: i64,
}

const fn default_check_interval() -> i64 {
    DEFAULT_CHECK_INTERVAL_MS
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdSetting::default(),
            check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
        }
    }
}

impl RouterConfig {
    pub fn thresholds(&self) -> Thresholds {
        self.threshold.resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_threshold_expands() {
        let config: RouterConfig =
            serde_json::from_str(r#"{"threshold": 0.5, "checkInterval": 60000}"#).unwrap();
        let t = config.thresholds();
        assert_eq!(t.session5h, 0.5);
        assert_eq!(t.weekly7d, 0.5);
        assert_eq!(t.weekly7d_sonnet, 0.5);
        assert_eq!(config.check_interval_ms, 60_000);
    }

    #[test]
    fn test_per_metric_threshold() {
        let config: RouterConfig = serde_json::from_str(
            r#"{"threshold": {"session5h": 0.9, "weekly7d": 0.8, "weekly7dSonnet": 0.7}}"#,
        )
        .unwrap();
        let t = config.thresholds();
        assert_eq!(t.session5h, 0.9);
        assert_eq!(t.weekly7d, 0.8);
        assert_eq!(t.weekly7d_sonnet, 0.7);
        assert_eq!(config.check_interval_ms, DEFAULT_CHECK_INTERVAL_MS);
    }

    #[test]
    fn test_scalar_round_trips_as_scalar() {
        let config: RouterConfig = serde_json::from_str(r#"{"threshold": 0.7}"#).unwrap();
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("threshold").unwrap().is_f64());
    }
}
