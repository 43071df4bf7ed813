//! Legacy account-source normalization and merge.
//!
//! Older releases stored the account list in different locations and with
//! different field names (`accessToken`/`refreshToken`/`expiresAt`, with
//! the expiry either epoch milliseconds or an ISO-8601 string). Migration
//! normalizes every record at the `serde_json::Value` level, then merges
//! all sources by account name so no account present anywhere is lost.

use serde_json::Value;

use quotaswitch_types::Account;

use crate::modules::logger;

fn string_field(record: &Value, primary: &str, legacy: &str) -> String {
    record
        .get(primary)
        .or_else(|| record.get(legacy))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Coalesce the expiry field: `expires`/`expiresAt`, epoch-ms number or
/// ISO-8601 string. Unparsable values become 0 (treated as expired).
fn expiry_field(record: &Value) -> i64 {
    let raw = match record.get("expires").or_else(|| record.get("expiresAt")) {
        Some(v) => v,
        None => return 0,
    };

    if let Some(ms) = raw.as_i64() {
        return ms;
    }
    if let Some(s) = raw.as_str() {
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
            return dt.timestamp_millis();
        }
    }
    0
}

/// Normalize one raw record into an [`Account`].
///
/// Returns `None` (and logs) when the record has no usable name; every
/// other field degrades to an empty/zero value rather than failing the
/// whole source.
pub fn normalize_account(record: &Value) -> Option<Account> {
    let name = record.get("name").and_then(Value::as_str).unwrap_or_default();
    if name.is_empty() {
        logger::log_warn("Skipping account record without a name");
        return None;
    }

    Some(Account {
        name: name.to_string(),
        access: string_field(record, "access", "accessToken"),
        refresh: string_field(record, "refresh", "refreshToken"),
        expires: expiry_field(record),
    })
}

/// Extract the account array from a source document.
///
/// Accepts either a bare array or an object wrapping one under
/// `accounts` (the shape of the old index file).
fn source_records(doc: &Value) -> Option<&Vec<Value>> {
    match doc {
        Value::Array(records) => Some(records),
        Value::Object(map) => map.get("accounts").and_then(Value::as_array),
        _ => None,
    }
}

/// Normalize one source document into accounts, skipping bad records.
pub(crate) fn normalize_source(doc: &Value, origin: &str) -> Vec<Account> {
    let Some(records) = source_records(doc) else {
        logger::log_warn(&format!("Ignoring {}: not an account list", origin));
        return Vec::new();
    };
    records.iter().filter_map(normalize_account).collect()
}

/// Pick the better of two records for the same account name.
///
/// A non-empty refresh credential beats an empty one; otherwise the later
/// expiry wins. Ties keep the earlier (higher-priority) source.
fn prefer(existing: &Account, candidate: &Account) -> bool {
    match (existing.refresh.is_empty(), candidate.refresh.is_empty()) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate.expires > existing.expires,
    }
}

/// Merge account sources, highest priority first.
///
/// Order within the result follows first appearance across the sources,
/// so the highest-priority source decides which account is primary.
pub fn merge_accounts(sources: Vec<Vec<Account>>) -> Vec<Account> {
    let mut merged: Vec<Account> = Vec::new();

    for source in sources {
        for account in source {
            match merged.iter_mut().find(|a| a.name == account.name) {
                Some(existing) => {
                    if prefer(existing, &account) {
                        *existing = account;
                    }
                }
                None => merged.push(account),
            }
        }
    }

    merged
}
