// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The mid-week reminder: nudge everyone who has not answered yet.
//!
//! Eligibility is the same as the Monday broadcast, so users who
//! responded (either way) in the meantime are left alone. The reminder
//! does not open a session; its buttons do.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use waggle_core::{
    AuditEvent, ChannelAdapter, ResponseRepository, UserDirectory, WaggleError, WeekStart,
};

use waggle_checkin::CheckinEngine;

use crate::broadcast::BatchSummary;
use crate::eligibility::{self, AudienceSource};
use crate::tick::TickSource;

pub struct ReminderBroadcast {
    engine: Arc<CheckinEngine>,
    channel: Arc<dyn ChannelAdapter>,
    directory: Arc<dyn UserDirectory>,
    repository: Arc<dyn ResponseRepository>,
    audience: AudienceSource,
    send_delay: Duration,
}

impl ReminderBroadcast {
    pub fn new(
        engine: Arc<CheckinEngine>,
        channel: Arc<dyn ChannelAdapter>,
        directory: Arc<dyn UserDirectory>,
        repository: Arc<dyn ResponseRepository>,
        audience: AudienceSource,
        send_delay: Duration,
    ) -> Self {
        Self {
            engine,
            channel,
            directory,
            repository,
            audience,
            send_delay,
        }
    }

    pub async fn run_once(&self) -> Result<BatchSummary, WaggleError> {
        let week = WeekStart::current();
        let recipients = eligibility::resolve_recipients(
            self.audience,
            &self.channel,
            &self.directory,
            &self.repository,
            week,
        )
        .await?;

        info!(week = %week, targets = recipients.len(), "starting reminder broadcast");

        let mut summary = BatchSummary {
            week,
            target_count: recipients.len(),
            success_count: 0,
            skipped_count: 0,
            error_count: 0,
        };

        for user in &recipients {
            match self
                .engine
                .send_reminder(&user.user_id, user.display_name.as_deref())
                .await
            {
                Ok(()) => summary.success_count += 1,
                Err(error) => {
                    warn!(user = %user.user_id, %error, "failed to send reminder");
                    summary.error_count += 1;
                }
            }
            tokio::time::sleep(self.send_delay).await;
        }

        info!(
            week = %week,
            sent = summary.success_count,
            errors = summary.error_count,
            "reminder broadcast completed"
        );

        let audit = AuditEvent::new("reminder_batch").with_details(serde_json::json!({
            "week_start": week.to_string(),
            "total_users": summary.target_count,
            "success_count": summary.success_count,
            "error_count": summary.error_count,
        }));
        if let Err(error) = self.repository.append_audit_event(&audit).await {
            warn!(%error, "audit append failed for reminder batch");
        }
        Ok(summary)
    }

    pub async fn run<T: TickSource>(&self, mut tick: T, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("reminder schedule stopped");
                    break;
                }
                fired = tick.next_tick() => {
                    match fired {
                        Some(at) => {
                            info!(at = %at, "reminder schedule fired");
                            if let Err(error) = self.run_once().await {
                                error!(%error, "reminder broadcast failed");
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    }
}
