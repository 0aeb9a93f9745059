// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles for the Waggle workspace.
//!
//! These mirror the real adapters closely enough that engine and
//! scheduler tests exercise the same invariants the SQLite and Slack
//! backends enforce, without touching disk or the network.

pub mod mock_channel;
pub mod mock_store;

pub use mock_channel::MockChannel;
pub use mock_store::MockStore;
