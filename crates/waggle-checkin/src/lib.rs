// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversational weekly check-in engine.
//!
//! Drives the questionnaire state machine over any [`ChannelAdapter`]:
//! participation prompt, category and tool selection, optional free-text
//! details, and the terminal upsert into the response repository.
//!
//! [`ChannelAdapter`]: waggle_core::ChannelAdapter

pub mod catalog;
pub mod engine;
pub mod messages;
pub mod router;
pub mod session;
pub mod shutdown;
pub mod store;

pub use engine::CheckinEngine;
pub use session::{Session, Step};
pub use store::SessionStore;
