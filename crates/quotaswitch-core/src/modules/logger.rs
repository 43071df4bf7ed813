//! Logging convenience wrappers.
//!
//! Thin wrappers around tracing macros used throughout the crate.

use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Install the global fmt subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Log info message (backward compatibility interface).
pub(crate) fn log_info(message: &str) {
    info!("{}", message);
}

/// Log warning message (backward compatibility interface).
pub(crate) fn log_warn(message: &str) {
    warn!("{}", message);
}

/// Log error message (backward compatibility interface).
pub(crate) fn log_error(message: &str) {
    error!("{}", message);
}
