//! # Quotaswitch Types
//!
//! Data models for quotaswitch, the multi-account API router.
//!
//! This crate provides the shared type system:
//!
//! - **`models::account`** - Credential records (`Account`)
//! - **`models::usage`** - Per-account rate-limit telemetry (`AccountUsage`, `MetricWindow`)
//! - **`models::config`** - Thresholds and recovery configuration (`RouterConfig`)
//! - **`models::state`** - The persisted per-process runtime state (`RuntimeState`)
//!
//! All types are:
//! - **Serializable** via serde, with wire field names matching the on-disk JSON
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod models;

pub use models::{
    Account, AccountUsage, MetricKind, MetricObservation, MetricStatus, MetricWindow,
    RouterConfig, RuntimeState, ThresholdSetting, Thresholds, UsageObservation,
};
