//! Shared helper functions for store operations.

use crate::error::StorageError;
use rusqlite::{ErrorCode, ffi};

/// Current time as RFC 3339 in UTC.
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Maps constraint failures onto the store's error taxonomy.
///
/// Unique/primary-key violations become `Conflict`, foreign-key violations
/// `NotFound` (the referenced row is missing), anything else `Constraint`.
pub(crate) fn classify(err: rusqlite::Error, what: &str) -> StorageError {
    if let rusqlite::Error::SqliteFailure(failure, msg) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            let detail = msg.clone().unwrap_or_else(|| failure.to_string());
            return match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    StorageError::Conflict(format!("{what}: {detail}"))
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    StorageError::NotFound(format!("{what}: {detail}"))
                }
                _ => StorageError::Constraint(format!("{what}: {detail}")),
            };
        }
    }
    StorageError::Sqlite(err)
}

/// JSON value to a nullable TEXT column.
pub(crate) fn json_to_column(value: &serde_json::Value) -> Option<String> {
    if value.is_null() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Nullable TEXT column back to JSON; unreadable text degrades to `Null`.
pub(crate) fn column_to_json(raw: Option<String>) -> serde_json::Value {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_json_maps_to_sql_null() {
        assert_eq!(json_to_column(&json!(null)), None);
        assert_eq!(json_to_column(&json!({"a": 1})).as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn column_roundtrip_tolerates_garbage() {
        assert_eq!(column_to_json(None), json!(null));
        assert_eq!(column_to_json(Some("{".into())), json!(null));
        assert_eq!(column_to_json(Some("[1]".into())), json!([1]));
    }

    #[test]
    fn non_constraint_errors_pass_through() {
        let err = classify(rusqlite::Error::QueryReturnedNoRows, "feature");
        assert!(matches!(err, StorageError::Sqlite(_)));
    }
}
