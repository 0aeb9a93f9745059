// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit log operations.

use rusqlite::params;
use waggle_core::types::{AuditEvent, AuditLogEntry, UserId};
use waggle_core::WaggleError;

use crate::database::Database;

/// Append an audit event.
pub async fn append_audit_event(db: &Database, event: &AuditEvent) -> Result<(), WaggleError> {
    let action = event.action.clone();
    let user_id = event.user_id.as_ref().map(|u| u.0.clone());
    let details = if event.details.is_null() {
        None
    } else {
        Some(event.details.to_string())
    };
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO audit_logs (action, user_id, details) VALUES (?1, ?2, ?3)",
                params![action, user_id, details],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The most recent audit log entries, newest first.
pub async fn recent_audit_events(
    db: &Database,
    limit: i64,
) -> Result<Vec<AuditLogEntry>, WaggleError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, action, user_id, details, created_at
                 FROM audit_logs ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                let details: Option<String> = row.get(3)?;
                let details = match details {
                    Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            3,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?,
                    None => serde_json::Value::Null,
                };
                Ok(AuditLogEntry {
                    id: row.get(0)?,
                    action: row.get(1)?,
                    user_id: row.get::<_, Option<String>>(2)?.map(UserId),
                    details,
                    created_at: row.get(4)?,
                })
            })?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
