//! Runtime state storage.
//!
//! The state file changes on every call, so it gets the same atomic-write
//! discipline as the account list but lives in its own file: a corrupted
//! write can then only take out runtime state, never credentials.

use quotaswitch_types::RuntimeState;

use crate::error::AppResult;
use crate::modules::storage::{read_json, write_json, StorePaths};

/// Load the runtime state, defaulting to an empty record on first run or
/// after unrecoverable corruption.
pub fn load_state(paths: &StorePaths) -> RuntimeState {
    read_json(&paths.state_path(), RuntimeState::default())
}

/// Save the runtime state atomically.
pub fn save_state(paths: &StorePaths, state: &RuntimeState) -> AppResult<()> {
    write_json(&paths.state_path(), state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_run_is_default() {
        let dir = TempDir::new().unwrap();
        let paths = StorePaths::rooted_at(dir.path());
        let state = load_state(&paths);
        assert_eq!(state, RuntimeState::default());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let paths = StorePaths::rooted_at(dir.path());

        let mut state = RuntimeState::default();
        state.current_account = Some("backup".to_string());
        state.request_count = 7;
        save_state(&paths, &state).unwrap();

        assert_eq!(load_state(&paths), state);
    }

    #[test]
    fn test_corrupt_state_recovers_from_backup() {
        let dir = TempDir::new().unwrap();
        let paths = StorePaths::rooted_at(dir.path());

        let mut state = RuntimeState::default();
        state.request_count = 1;
        save_state(&paths, &state).unwrap();
        state.request_count = 2;
        save_state(&paths, &state).unwrap();

        std::fs::write(paths.state_path(), "oops").unwrap();
        // Backup holds the state as of the last successful write's copy.
        assert_eq!(load_state(&paths).request_count, 1);
    }
}
