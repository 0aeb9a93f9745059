// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./waggle.toml` > `~/.config/waggle/waggle.toml` > `/etc/waggle/waggle.toml`
//! with environment variable overrides via `WAGGLE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WaggleConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/waggle/waggle.toml` (system-wide)
/// 3. `~/.config/waggle/waggle.toml` (user XDG config)
/// 4. `./waggle.toml` (local directory)
/// 5. `WAGGLE_*` environment variables
pub fn load_config() -> Result<WaggleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WaggleConfig::default()))
        .merge(Toml::file("/etc/waggle/waggle.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("waggle/waggle.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("waggle.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<WaggleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WaggleConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WaggleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WaggleConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `WAGGLE_SLACK_BOT_TOKEN` must
/// map to `slack.bot_token`, not `slack.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("WAGGLE_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: WAGGLE_SLACK_BOT_TOKEN -> "slack_bot_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("slack_", "slack.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("schedule_", "schedule.", 1);
        mapped.into()
    })
}
