//! Path utilities for quotaswitch data storage.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Directory name for data storage.
pub const DATA_DIR: &str = ".quotaswitch";
/// Filename for the canonical account list.
pub const ACCOUNTS_FILE: &str = "accounts.json";
/// Filename for the runtime state.
pub const STATE_FILE: &str = "state.json";

/// Resolved storage locations for one process.
///
/// All file access goes through this struct so tests can point the stores
/// at a temp directory instead of mutating process-global env vars.
#[derive(Debug, Clone)]
pub struct StorePaths {
    data_dir: PathBuf,
    home_dir: PathBuf,
}

impl StorePaths {
    /// Resolve storage locations for normal operation.
    ///
    /// Priority:
    /// 1. `QUOTASWITCH_DATA_DIR` environment variable (for container deployments)
    /// 2. `~/.quotaswitch` (default for desktop usage)
    pub fn resolve() -> AppResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::Config("Cannot get home directory".to_string()))?;

        let data_dir = if let Ok(custom_dir) = std::env::var("QUOTASWITCH_DATA_DIR") {
            PathBuf::from(custom_dir)
        } else {
            home.join(DATA_DIR)
        };

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }

        Ok(Self {
            data_dir,
            home_dir: home,
        })
    }

    /// Build paths rooted at an explicit directory (tests, embedders).
    pub fn rooted_at(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            data_dir: dir.join(DATA_DIR),
            home_dir: dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Canonical account list.
    pub fn accounts_path(&self) -> PathBuf {
        self.data_dir.join(ACCOUNTS_FILE)
    }

    /// Runtime state file.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }

    /// Legacy account list locations, in fixed priority order.
    ///
    /// Earlier entries win field-level preference only through the merge
    /// rules; no account present in any of these is ever dropped.
    pub fn legacy_account_paths(&self) -> Vec<PathBuf> {
        vec![
            self.home_dir.join(".quotaswitch_accounts.json"),
            self.home_dir
                .join(".config")
                .join("quotaswitch")
                .join(ACCOUNTS_FILE),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_paths() {
        let paths = StorePaths::rooted_at("/tmp/qs-test");
        assert_eq!(
            paths.accounts_path(),
            PathBuf::from("/tmp/qs-test/.quotaswitch/accounts.json")
        );
        assert_eq!(
            paths.state_path(),
            PathBuf::from("/tmp/qs-test/.quotaswitch/state.json")
        );
        let legacy = paths.legacy_account_paths();
        assert_eq!(legacy.len(), 2);
        assert_eq!(
            legacy[0],
            PathBuf::from("/tmp/qs-test/.quotaswitch_accounts.json")
        );
    }
}
