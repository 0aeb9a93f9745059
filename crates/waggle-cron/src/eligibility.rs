// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast audience resolution.
//!
//! The base audience comes either from the stored user directory or
//! from the configured channel's membership. Either way, opted-out and
//! inactive users are excluded, and so is anyone who already has a
//! response recorded for the target week.

use std::sync::Arc;

use waggle_core::{
    ChannelAdapter, ResponseRepository, User, UserDirectory, WaggleError, WeekStart,
};

/// Where the base broadcast audience comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum AudienceSource {
    Directory,
    Channel,
}

pub async fn resolve_recipients(
    audience: AudienceSource,
    channel: &Arc<dyn ChannelAdapter>,
    directory: &Arc<dyn UserDirectory>,
    repository: &Arc<dyn ResponseRepository>,
    week: WeekStart,
) -> Result<Vec<User>, WaggleError> {
    let base = match audience {
        AudienceSource::Directory => directory.list_active_users().await?,
        AudienceSource::Channel => {
            let mut users = Vec::new();
            for member in channel.list_members().await? {
                // Channel members may never have talked to the bot;
                // register them so they get directory records.
                let user = directory.ensure_user(&member, None).await?;
                if user.is_active && !user.opted_out {
                    users.push(user);
                }
            }
            users
        }
    };

    let mut recipients = Vec::with_capacity(base.len());
    for user in base {
        if repository.has_response(&user.user_id, week).await? {
            tracing::debug!(user = %user.user_id, week = %week, "already responded, skipping");
            continue;
        }
        recipients.push(user);
    }
    Ok(recipients)
}
