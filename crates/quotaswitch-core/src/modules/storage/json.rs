//! Atomic JSON file primitive shared by the account and state stores.
//!
//! Write sequence: back up the current file, write the new content to a
//! `.tmp` sibling, then rename over the target. A reader therefore always
//! sees either the old complete document or the new complete document.
//! Reads fall back to the `.bak` copy when the target is missing or
//! unparsable.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppResult;
use crate::modules::logger;

/// Append a suffix to a path without touching its extension.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// Backup path for a storage file.
pub(crate) fn backup_path(path: &Path) -> PathBuf {
    sibling(path, ".bak")
}

/// Read outcome for a single file: missing, corrupt, or parsed.
enum ReadAttempt<T> {
    Missing,
    Corrupt(String),
    Parsed(T),
}

fn try_read<T: DeserializeOwned>(path: &Path) -> ReadAttempt<T> {
    if !path.exists() {
        return ReadAttempt::Missing;
    }
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return ReadAttempt::Corrupt(format!("read failed: {}", e)),
    };
    match serde_json::from_str(&content) {
        Ok(v) => ReadAttempt::Parsed(v),
        Err(e) => ReadAttempt::Corrupt(format!("parse failed: {}", e)),
    }
}

/// Read a JSON file, recovering from the `.bak` copy if needed.
///
/// Returns `default` when neither the file nor its backup is readable.
/// Backup recovery is a recoverable event, not an error; losing both
/// copies is logged as data loss but still returns the default so the
/// caller can proceed with an empty store.
pub fn read_json<T: DeserializeOwned>(path: &Path, default: T) -> T {
    let primary = try_read(path);
    let primary_failure = match primary {
        ReadAttempt::Parsed(v) => return v,
        ReadAttempt::Missing => None,
        ReadAttempt::Corrupt(reason) => Some(reason),
    };

    let bak = backup_path(path);
    match try_read(&bak) {
        ReadAttempt::Parsed(v) => {
            logger::log_warn(&format!(
                "Recovered {} from backup {}",
                path.display(),
                bak.display()
            ));
            v
        }
        _ => {
            if let Some(reason) = primary_failure {
                logger::log_error(&format!(
                    "Unreadable {} ({}) and no usable backup, falling back to default",
                    path.display(),
                    reason
                ));
            }
            default
        }
    }
}

/// Write a JSON file atomically, keeping a `.bak` of the previous content.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    if path.exists() {
        let bak = backup_path(path);
        if let Err(e) = fs::copy(path, &bak) {
            logger::log_warn(&format!("Backup of {} failed: {}", path.display(), e));
        }
    }

    let content = serde_json::to_string_pretty(value)?;
    let temp_path = sibling(path, ".tmp");

    if let Err(e) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        e.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");

        write_json(&path, &json!({"a": 1})).unwrap();
        let value: Value = read_json(&path, Value::Null);
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_missing_file_returns_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        let value: Value = read_json(&path, json!({"fresh": true}));
        assert_eq!(value, json!({"fresh": true}));
    }

    #[test]
    fn test_backup_recovery_on_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");

        write_json(&path, &json!({"v": 1})).unwrap();
        write_json(&path, &json!({"v": 2})).unwrap();

        // Corrupt the primary; the .bak from the second write holds v=1.
        fs::write(&path, "{not json").unwrap();
        let value: Value = read_json(&path, Value::Null);
        assert_eq!(value, json!({"v": 1}));
    }

    #[test]
    fn test_both_corrupt_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");

        fs::write(&path, "{not json").unwrap();
        fs::write(backup_path(&path), "also bad").unwrap();
        let value: Value = read_json(&path, json!([]));
        assert_eq!(value, json!([]));
    }

    #[test]
    fn test_interrupted_before_rename_leaves_old_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");

        write_json(&path, &json!({"v": "old"})).unwrap();

        // Simulate a crash between the tmp write and the rename: the tmp
        // file exists with new content but the target was never replaced.
        fs::write(sibling(&path, ".tmp"), r#"{"v": "new"}"#).unwrap();

        let value: Value = read_json(&path, Value::Null);
        assert_eq!(value, json!({"v": "old"}));

        // A later successful write replaces the stale tmp file.
        write_json(&path, &json!({"v": "newer"})).unwrap();
        let value: Value = read_json(&path, Value::Null);
        assert_eq!(value, json!({"v": "newer"}));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deep").join("data.json");
        write_json(&path, &json!(42)).unwrap();
        let value: Value = read_json(&path, Value::Null);
        assert_eq!(value, json!(42));
    }
}
