// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tick sources that drive the schedulers.
//!
//! [`CronTick`] sleeps until the next cron occurrence; [`ManualTick`]
//! fires whenever a test (or the trigger CLI) pushes a timestamp.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use croner::Cron;
use tokio::sync::mpsc;
use waggle_core::WaggleError;

/// Produces scheduler wake-ups. Returning `None` ends the schedule.
#[async_trait]
pub trait TickSource: Send {
    async fn next_tick(&mut self) -> Option<DateTime<Utc>>;
}

/// Wall-clock ticks from a cron expression, evaluated in UTC.
pub struct CronTick {
    schedule: Cron,
}

impl CronTick {
    pub fn new(expression: &str) -> Result<Self, WaggleError> {
        let schedule = Cron::new(expression).parse().map_err(|e| {
            WaggleError::Scheduler(format!("invalid cron expression {expression:?}: {e}"))
        })?;
        Ok(Self { schedule })
    }
}

#[async_trait]
impl TickSource for CronTick {
    async fn next_tick(&mut self) -> Option<DateTime<Utc>> {
        let now = Utc::now();
        let next = match self.schedule.find_next_occurrence(&now, false) {
            Ok(next) => next,
            Err(error) => {
                tracing::error!(%error, "cron schedule has no next occurrence");
                return None;
            }
        };
        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;
        Some(next)
    }
}

/// Externally driven ticks, for tests and the manual trigger path.
pub struct ManualTick {
    rx: mpsc::Receiver<DateTime<Utc>>,
}

impl ManualTick {
    pub fn new() -> (mpsc::Sender<DateTime<Utc>>, Self) {
        let (tx, rx) = mpsc::channel(8);
        (tx, Self { rx })
    }
}

#[async_trait]
impl TickSource for ManualTick {
    async fn next_tick(&mut self) -> Option<DateTime<Utc>> {
        self.rx.recv().await
    }
}
