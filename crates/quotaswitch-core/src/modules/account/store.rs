//! Canonical account list storage.

use std::fs;

use serde_json::Value;

use quotaswitch_types::Account;

use crate::error::AppResult;
use crate::modules::logger;
use crate::modules::storage::{read_json, write_json, StorePaths};

use super::migration::{merge_accounts, normalize_source};

/// Load the account list.
///
/// The canonical file wins when readable (directly or via its backup).
/// Otherwise every legacy location is read in priority order, normalized,
/// and merged by name; a non-empty merge result is persisted back to the
/// canonical location so the migration happens exactly once.
pub fn load_accounts(paths: &StorePaths) -> AppResult<Vec<Account>> {
    let canonical = paths.accounts_path();
    let doc: Value = read_json(&canonical, Value::Null);

    if !doc.is_null() {
        return Ok(normalize_source(&doc, &canonical.display().to_string()));
    }

    let mut sources = Vec::new();
    for legacy in paths.legacy_account_paths() {
        if !legacy.exists() {
            continue;
        }
        let content = match fs::read_to_string(&legacy) {
            Ok(c) => c,
            Err(e) => {
                logger::log_warn(&format!("Cannot read legacy {}: {}", legacy.display(), e));
                continue;
            }
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(doc) => {
                let accounts = normalize_source(&doc, &legacy.display().to_string());
                if !accounts.is_empty() {
                    logger::log_info(&format!(
                        "Migrating {} account(s) from {}",
                        accounts.len(),
                        legacy.display()
                    ));
                }
                sources.push(accounts);
            }
            Err(e) => {
                logger::log_warn(&format!("Cannot parse legacy {}: {}", legacy.display(), e));
            }
        }
    }

    let merged = merge_accounts(sources);
    if !merged.is_empty() {
        // The merged list is usable without the persist; a failed write
        // just means the migration runs again on the next load.
        match save_accounts(paths, &merged) {
            Ok(()) => logger::log_info(&format!(
                "Account migration complete: {} account(s) now at {}",
                merged.len(),
                canonical.display()
            )),
            Err(e) => logger::log_warn(&format!(
                "Account migration write failed, continuing in memory: {}",
                e
            )),
        }
    }

    Ok(merged)
}

/// Save the account list atomically.
pub fn save_accounts(paths: &StorePaths, accounts: &[Account]) -> AppResult<()> {
    write_json(&paths.accounts_path(), &accounts)
}
