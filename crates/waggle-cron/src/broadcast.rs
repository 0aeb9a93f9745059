// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Monday broadcast: open a check-in with every eligible user.
//!
//! Per-user failures are isolated; one user's delivery error never
//! aborts the batch. An eligibility resolution failure does abort the
//! run, since sending blind risks double prompts.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use waggle_core::{
    AuditEvent, ChannelAdapter, ResponseRepository, UserDirectory, WaggleError, WeekStart,
};

use waggle_checkin::CheckinEngine;

use crate::eligibility::{self, AudienceSource};
use crate::tick::TickSource;

/// Outcome of one broadcast run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub week: WeekStart,
    pub target_count: usize,
    pub success_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
}

pub struct CheckinBroadcast {
    engine: Arc<CheckinEngine>,
    channel: Arc<dyn ChannelAdapter>,
    directory: Arc<dyn UserDirectory>,
    repository: Arc<dyn ResponseRepository>,
    audience: AudienceSource,
    send_delay: Duration,
}

impl CheckinBroadcast {
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

    /// Run one broadcast for the current week.
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

        info!(week = %week, targets = recipients.len(), "starting weekly check-in broadcast");

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
                .start_checkin(&user.user_id, user.display_name.as_deref())
                .await
            {
                Ok(true) => summary.success_count += 1,
                Ok(false) => summary.skipped_count += 1,
                Err(error) => {
                    warn!(user = %user.user_id, %error, "failed to send check-in");
                    summary.error_count += 1;
                }
            }
            // Pace sends to stay under platform rate limits.
            tokio::time::sleep(self.send_delay).await;
        }

        info!(
            week = %week,
            sent = summary.success_count,
            skipped = summary.skipped_count,
            errors = summary.error_count,
            "weekly check-in broadcast completed"
        );

        let audit = AuditEvent::new("weekly_checkin_batch").with_details(serde_json::json!({
            "week_start": week.to_string(),
            "total_users": summary.target_count,
            "success_count": summary.success_count,
            "error_count": summary.error_count,
        }));
        if let Err(error) = self.repository.append_audit_event(&audit).await {
            warn!(%error, "audit append failed for broadcast batch");
        }
        Ok(summary)
    }

    /// Run broadcasts on every tick until the source ends or the token
    /// is cancelled.
    pub async fn run<T: TickSource>(&self, mut tick: T, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("check-in broadcast schedule stopped");
                    break;
                }
                fired = tick.next_tick() => {
                    match fired {
                        Some(at) => {
                            info!(at = %at, "check-in schedule fired");
                            if let Err(error) = self.run_once().await {
                                error!(%error, "weekly check-in broadcast failed");
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use waggle_core::{UserId, WeeklyResponse};
    use waggle_test_utils::{MockChannel, MockStore};

    use crate::tick::ManualTick;

    fn broadcast(
        channel: &Arc<MockChannel>,
        store: &Arc<MockStore>,
        delay: Duration,
    ) -> CheckinBroadcast {
        let engine = Arc::new(CheckinEngine::new(
            channel.clone(),
            store.clone(),
            store.clone(),
        ));
        CheckinBroadcast::new(
            engine,
            channel.clone(),
            store.clone(),
            store.clone(),
            AudienceSource::Directory,
            delay,
        )
    }

    #[tokio::test]
    async fn run_once_prompts_only_eligible_users() {
        let channel = Arc::new(MockChannel::new());
        let store = Arc::new(MockStore::new());
        store.seed_user(MockStore::make_user("U1", Some("One")));
        store.seed_user(MockStore::make_user("U2", None));
        store
            .upsert_weekly_response(&WeeklyResponse::new(
                UserId("U2".into()),
                WeekStart::current(),
                true,
            ))
            .await
            .unwrap();

        let summary = broadcast(&channel, &store, Duration::ZERO)
            .run_once()
            .await
            .unwrap();

        assert_eq!(summary.target_count, 1);
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.error_count, 0);
        assert_eq!(channel.sent_to(&UserId("U1".into())).len(), 1);
        assert!(channel.sent_to(&UserId("U2".into())).is_empty());
        assert!(store
            .audit_actions()
            .contains(&"weekly_checkin_batch".to_string()));
    }

    #[tokio::test]
    async fn per_user_failures_do_not_abort_the_batch() {
        let channel = Arc::new(MockChannel::new());
        let store = Arc::new(MockStore::new());
        store.seed_user(MockStore::make_user("U1", None));
        store.seed_user(MockStore::make_user("U2", None));
        channel.fail_sends_to(&UserId("U1".into()));

        let summary = broadcast(&channel, &store, Duration::ZERO)
            .run_once()
            .await
            .unwrap();

        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.error_count, 1);
        assert_eq!(channel.sent_to(&UserId("U2".into())).len(), 1);
    }

    #[tokio::test]
    async fn run_fires_on_ticks_and_stops_on_cancel() {
        let channel = Arc::new(MockChannel::new());
        let store = Arc::new(MockStore::new());
        store.seed_user(MockStore::make_user("U1", None));

        let broadcast = broadcast(&channel, &store, Duration::ZERO);
        let (tx, tick) = ManualTick::new();
        let cancel = CancellationToken::new();

        let runner = {
            let cancel = cancel.clone();
            async move { broadcast.run(tick, cancel).await }
        };
        let handle = tokio::spawn(runner);

        tx.send(Utc::now()).await.unwrap();
        // Wait for the tick to be consumed.
        tokio::time::timeout(Duration::from_secs(1), async {
            while channel.sent().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(channel.sent().len(), 1);
    }
}
