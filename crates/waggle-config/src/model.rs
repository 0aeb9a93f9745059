// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Waggle check-in bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Waggle configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WaggleConfig {
    /// Bot identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Slack integration settings.
    #[serde(default)]
    pub slack: SlackConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Weekly broadcast and reminder schedule settings.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Bot identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the bot.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "waggle".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Slack integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SlackConfig {
    /// Bot user OAuth token (xoxb-...). Required to serve.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Signing secret used to verify inbound webhook requests.
    #[serde(default)]
    pub signing_secret: Option<String>,

    /// Channel whose membership defines the broadcast audience when
    /// `schedule.audience = "channel"`.
    #[serde(default)]
    pub channel_id: Option<String>,

    /// Address the webhook server binds to.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Port the webhook server binds to.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            signing_secret: None,
            channel_id: None,
            listen_address: default_listen_address(),
            listen_port: default_listen_port(),
        }
    }
}

fn default_listen_address() -> String {
    "127.0.0.1".to_string()
}

fn default_listen_port() -> u16 {
    8787
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Whether to enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("waggle/waggle.db").display().to_string())
        .unwrap_or_else(|| "waggle.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Weekly broadcast and reminder schedule configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Master switch for the background schedulers.
    #[serde(default = "default_schedule_enabled")]
    pub enabled: bool,

    /// Cron expression for the weekly check-in broadcast (UTC).
    /// Default: Monday 10:00.
    #[serde(default = "default_checkin_cron")]
    pub checkin_cron: String,

    /// Cron expression for the mid-week reminder (UTC).
    /// Default: Thursday 14:00.
    #[serde(default = "default_reminder_cron")]
    pub reminder_cron: String,

    /// Delay between consecutive sends within a batch, in milliseconds.
    /// Keeps the bot under the platform's rate limits.
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,

    /// Where the broadcast audience comes from: "directory" (stored active
    /// users) or "channel" (live channel membership).
    #[serde(default = "default_audience")]
    pub audience: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: default_schedule_enabled(),
            checkin_cron: default_checkin_cron(),
            reminder_cron: default_reminder_cron(),
            send_delay_ms: default_send_delay_ms(),
            audience: default_audience(),
        }
    }
}

fn default_schedule_enabled() -> bool {
    true
}

fn default_checkin_cron() -> String {
    "0 10 * * 1".to_string()
}

fn default_reminder_cron() -> String {
    "0 14 * * 4".to_string()
}

fn default_send_delay_ms() -> u64 {
    100
}

fn default_audience() -> String {
    "directory".to_string()
}
