// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled broadcasts: the Monday check-in and the mid-week reminder.
//!
//! Both run the same shape: a [`TickSource`] fires, eligibility is
//! resolved against the directory and the week's responses, and the
//! engine sends to each recipient with per-user error isolation.
//!
//! [`TickSource`]: tick::TickSource

pub mod broadcast;
pub mod eligibility;
pub mod reminder;
pub mod tick;

pub use broadcast::{BatchSummary, CheckinBroadcast};
pub use eligibility::AudienceSource;
pub use reminder::ReminderBroadcast;
pub use tick::{CronTick, ManualTick, TickSource};
