// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack channel adapter: Web API client, signed webhook server, and
//! payload mapping onto the engine's event types.

pub mod adapter;
pub mod client;
pub mod events;
pub mod server;
pub mod signature;

pub use adapter::SlackChannel;
pub use client::SlackClient;
