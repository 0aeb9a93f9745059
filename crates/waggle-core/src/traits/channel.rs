// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for chat platform integrations.

use async_trait::async_trait;

use crate::error::WaggleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundEvent, MessageId, OutboundMessage, UserId};

/// Adapter for bidirectional chat channel integrations.
///
/// Channel adapters connect Waggle to the external chat platform,
/// handling event ingestion, message delivery, and audience listing.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the chat platform (webhook server, socket).
    async fn connect(&mut self) -> Result<(), WaggleError>;

    /// Sends a direct message to a user.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, WaggleError>;

    /// Receives the next inbound event from the channel.
    async fn next_event(&self) -> Result<InboundEvent, WaggleError>;

    /// Lists the members of the configured broadcast audience channel.
    async fn list_members(&self) -> Result<Vec<UserId>, WaggleError>;
}
