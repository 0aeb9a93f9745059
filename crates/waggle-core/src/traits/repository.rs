// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository trait for weekly response and audit persistence.

use async_trait::async_trait;

use crate::error::WaggleError;
use crate::types::{
    AuditEvent, AuditLogEntry, ResponseFilter, UserId, WeekStart, WeeklyResponse,
};

/// Persistence contract for weekly responses and the audit log.
///
/// `upsert_weekly_response` is keyed by (user, week): repeating a terminal
/// transition within the same week replaces the earlier row instead of
/// duplicating it. This is what makes finalize retries safe.
#[async_trait]
pub trait ResponseRepository: Send + Sync + 'static {
    /// Insert or replace the response for (user, week).
    async fn upsert_weekly_response(&self, response: &WeeklyResponse)
        -> Result<(), WaggleError>;

    /// Query responses matching the filter, newest first.
    async fn find_responses(
        &self,
        filter: &ResponseFilter,
    ) -> Result<Vec<WeeklyResponse>, WaggleError>;

    /// Whether the user already has a response recorded for the week.
    async fn has_response(&self, user_id: &UserId, week: WeekStart)
        -> Result<bool, WaggleError>;

    /// Append an audit event. Callers treat failures as best-effort.
    async fn append_audit_event(&self, event: &AuditEvent) -> Result<(), WaggleError>;

    /// The most recent audit log entries, newest first.
    async fn recent_audit_events(&self, limit: i64)
        -> Result<Vec<AuditLogEntry>, WaggleError>;
}
