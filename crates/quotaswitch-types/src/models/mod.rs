//! Core domain models for quotaswitch.

mod account;
mod config;
mod state;
mod usage;

pub use account::Account;
pub use config::{RouterConfig, ThresholdSetting, Thresholds};
pub use state::RuntimeState;
pub use usage::{
    AccountUsage, MetricKind, MetricObservation, MetricStatus, MetricWindow, UsageObservation,
};
