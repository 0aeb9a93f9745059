// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as parseable cron expressions and known audience names.

use crate::diagnostic::ConfigError;
use crate::model::WaggleConfig;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const VALID_AUDIENCES: &[&str] = &["directory", "channel"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &WaggleConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !VALID_LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level must be one of {}, got `{}`",
                VALID_LOG_LEVELS.join(", "),
                config.agent.log_level
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.slack.listen_address.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "slack.listen_address must not be empty".to_string(),
        });
    } else {
        let addr = config.slack.listen_address.trim();
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "slack.listen_address `{addr}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    for (key, expr) in [
        ("schedule.checkin_cron", &config.schedule.checkin_cron),
        ("schedule.reminder_cron", &config.schedule.reminder_cron),
    ] {
        if let Err(e) = croner::Cron::new(expr).parse() {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{expr}` is not a valid cron expression: {e}"),
            });
        }
    }

    if !VALID_AUDIENCES.contains(&config.schedule.audience.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "schedule.audience must be one of {}, got `{}`",
                VALID_AUDIENCES.join(", "),
                config.schedule.audience
            ),
        });
    }

    // A one-minute per-recipient delay would stall a batch past the next tick.
    if config.schedule.send_delay_ms > 60_000 {
        errors.push(ConfigError::Validation {
            message: format!(
                "schedule.send_delay_ms must be at most 60000, got {}",
                config.schedule.send_delay_ms
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
