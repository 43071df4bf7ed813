//! # Quotaswitch Core
//!
//! Core logic for quotaswitch, a router that spreads outbound API calls
//! across several credential sets for one upstream service and fails over
//! proactively on quota-utilization telemetry.
//!
//! ```text
//! quotaswitch-core/src/modules/
//! ├── storage/      # Atomic JSON read/write primitive + data-dir paths
//! ├── account/      # Canonical account list + legacy-source migration
//! ├── state_store.rs# Runtime state (active account, usage, counters)
//! ├── usage.rs      # Per-account utilization tracker
//! ├── selection.rs  # Threshold/recovery hysteresis state machine
//! ├── oauth.rs      # Credential refresh exchange
//! └── router.rs     # Per-call orchestration over the above
//! ```
//!
//! Per call: load accounts + state → reconcile usage → select account →
//! ensure a fresh credential (with failover) → caller dispatches → record
//! telemetry → persist.

pub mod error;
pub mod modules;

pub use error::{AppError, AppResult};
pub use modules::router::{PreparedCall, Router};
pub use modules::storage::StorePaths;
