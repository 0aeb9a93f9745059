// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory trait for community member records.

use async_trait::async_trait;

use crate::error::WaggleError;
use crate::types::{User, UserId};

/// Contract for the stored community member directory.
///
/// Members are auto-registered on first contact via [`ensure_user`], so the
/// directory is always a superset of everyone the bot has ever heard from.
///
/// [`ensure_user`]: UserDirectory::ensure_user
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Fetch a user record, or create it if this is first contact.
    ///
    /// When `display_name` is provided it refreshes the stored name.
    async fn ensure_user(
        &self,
        user_id: &UserId,
        display_name: Option<&str>,
    ) -> Result<User, WaggleError>;

    /// Fetch a user record without creating one.
    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, WaggleError>;

    /// Set or clear the user's opt-out flag.
    async fn set_opted_out(&self, user_id: &UserId, opted_out: bool)
        -> Result<(), WaggleError>;

    /// All user records, active or not.
    async fn list_users(&self) -> Result<Vec<User>, WaggleError>;

    /// Active, non-opted-out users eligible for broadcasts.
    async fn list_active_users(&self) -> Result<Vec<User>, WaggleError>;
}
