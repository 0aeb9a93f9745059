// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Waggle framework.

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a user on the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// The Monday that anchors a reporting week.
///
/// All weekly responses are keyed by this date. Two events occurring in the
/// same Monday-to-Sunday span always resolve to the same `WeekStart`,
/// regardless of timezone offsets applied upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeekStart(NaiveDate);

impl WeekStart {
    /// The week containing the given date.
    pub fn containing(date: NaiveDate) -> Self {
        Self(date.week(Weekday::Mon).first_day())
    }

    /// The week containing today (UTC).
    pub fn current() -> Self {
        Self::containing(Utc::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The week `n` weeks before this one.
    pub fn minus_weeks(&self, n: u32) -> Self {
        Self(self.0 - chrono::Duration::weeks(i64::from(n)))
    }
}

impl std::fmt::Display for WeekStart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl std::str::FromStr for WeekStart {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(NaiveDate::parse_from_str(s, "%Y-%m-%d")?))
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter in the plugin registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

/// A registered community member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub opted_out: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A finalized weekly check-in response.
///
/// At most one row exists per (user, week); terminal writes are upserts,
/// so re-submitting within the same week replaces the earlier answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyResponse {
    pub user_id: UserId,
    pub week_start: WeekStart,
    pub participated: bool,
    pub categories: Vec<String>,
    pub tools: Vec<String>,
    pub custom_tools: Vec<String>,
    pub custom_details: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl WeeklyResponse {
    /// A blank response for the given user and week.
    pub fn new(user_id: UserId, week_start: WeekStart, participated: bool) -> Self {
        Self {
            user_id,
            week_start,
            participated,
            categories: Vec::new(),
            tools: Vec::new(),
            custom_tools: Vec::new(),
            custom_details: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}

/// Filter for querying weekly responses. All fields are conjunctive;
/// `None` means "any".
#[derive(Debug, Clone, Default)]
pub struct ResponseFilter {
    pub week_start: Option<WeekStart>,
    pub user_id: Option<UserId>,
    pub participated: Option<bool>,
    pub category: Option<String>,
    pub tool: Option<String>,
    pub limit: Option<i64>,
}

/// An audit event to be appended to the audit log.
///
/// Audit writes are best-effort everywhere: failures are logged and
/// swallowed, never propagated into user-facing flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub action: String,
    pub user_id: Option<UserId>,
    pub details: serde_json::Value,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            user_id: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn for_user(action: impl Into<String>, user_id: UserId) -> Self {
        Self {
            action: action.into(),
            user_id: Some(user_id),
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// A stored audit log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub action: String,
    pub user_id: Option<UserId>,
    pub details: serde_json::Value,
    pub created_at: String,
}

/// An interactive action received from the chat platform.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEvent {
    /// "Yes, I participated" button on the weekly prompt or reminder.
    ParticipationYes,
    /// "Not this week" button.
    ParticipationNo,
    /// Category checkbox state changed; carries the full current selection.
    CategoriesSelected(Vec<String>),
    /// "Next" after category selection.
    CategoriesNext,
    /// Tool checkbox state changed; carries the full current selection.
    ToolsSelected(Vec<String>),
    /// "Next" after tool selection, with any free-text "other tool" entry.
    ToolsNext { other_tool: Option<String> },
    /// Final submit with optional free-text details.
    DetailsSubmit(Option<String>),
    /// Skip the free-text details step.
    DetailsSkip,
}

/// The kind of inbound event delivered by a channel adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// A free-text direct message.
    Message(String),
    /// An interactive component action (button, checkbox).
    Action(ActionEvent),
    /// A slash command invocation.
    Command { name: String, text: String },
}

/// An inbound event received from a channel adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    /// Platform-assigned event identifier, used for at-least-once de-dup.
    pub id: String,
    pub user: UserId,
    /// Display name when the platform provides one alongside the event.
    pub display_name: Option<String>,
    pub kind: EventKind,
}

/// An outbound message to be sent via a channel adapter.
///
/// `blocks` carries platform-specific rich layout as opaque JSON; adapters
/// that do not support rich layout fall back to `text`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub user: UserId,
    pub text: String,
    pub blocks: Option<serde_json::Value>,
}

impl OutboundMessage {
    pub fn text(user: UserId, text: impl Into<String>) -> Self {
        Self {
            user,
            text: text.into(),
            blocks: None,
        }
    }

    pub fn with_blocks(user: UserId, text: impl Into<String>, blocks: serde_json::Value) -> Self {
        Self {
            user,
            text: text.into(),
            blocks: Some(blocks),
        }
    }
}
