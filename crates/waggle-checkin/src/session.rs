// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-flight questionnaire state for a single user.
//!
//! A session exists only between the first affirmative answer and the
//! closing message. Everything durable lives in the response repository;
//! losing a session mid-flow only costs the user a restart.

use chrono::{DateTime, Utc};
use waggle_core::{UserId, WeekStart};

/// Where the user currently is in the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Step {
    AwaitingParticipation,
    CategorySelection,
    ToolSelection,
    CustomDetails,
}

/// Answers accumulated so far, before they are turned into a
/// [`waggle_core::WeeklyResponse`].
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub participated: bool,
    pub categories: Vec<String>,
    pub tools: Vec<String>,
    pub custom_tools: Vec<String>,
    pub custom_details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserId,
    pub week: WeekStart,
    pub step: Step,
    pub draft: Draft,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: UserId, week: WeekStart) -> Self {
        let now = Utc::now();
        Self {
            user,
            week,
            step: Step::AwaitingParticipation,
            draft: Draft::default(),
            started_at: now,
            updated_at: now,
        }
    }

    /// Advance to the next step and refresh the activity timestamp.
    pub fn advance(&mut self, step: Step) {
        self.step = step;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
