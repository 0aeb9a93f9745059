// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `waggle serve` command implementation.
//!
//! Wires the SQLite storage, the Slack adapter, the check-in engine,
//! and (when enabled) the two cron schedulers, then drains inbound
//! events until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use waggle_checkin::shutdown;
use waggle_checkin::{messages, CheckinEngine};
use waggle_config::WaggleConfig;
use waggle_core::{
    ChannelAdapter, ResponseRepository, StorageAdapter, UserDirectory, WaggleError,
};
use waggle_cron::{AudienceSource, CheckinBroadcast, CronTick, ReminderBroadcast};
use waggle_slack::SlackChannel;
use waggle_storage::SqliteStorage;

/// How often abandoned questionnaire sessions are swept out of memory.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub(crate) fn parse_audience(config: &WaggleConfig) -> Result<AudienceSource, WaggleError> {
    config.schedule.audience.parse().map_err(|_| {
        WaggleError::Config(format!(
            "schedule.audience must be \"directory\" or \"channel\", got {:?}",
            config.schedule.audience
        ))
    })
}

/// Runs the `waggle serve` command.
pub async fn run_serve(config: WaggleConfig) -> Result<(), WaggleError> {
    info!("starting waggle serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let mut slack = SlackChannel::new(config.slack.clone())?;
    slack.connect().await?;
    let channel: Arc<dyn ChannelAdapter> = Arc::new(slack);

    let repository: Arc<dyn ResponseRepository> = storage.clone();
    let directory: Arc<dyn UserDirectory> = storage.clone();
    let engine = Arc::new(CheckinEngine::new(
        channel.clone(),
        repository.clone(),
        directory.clone(),
    ));

    let cancel = shutdown::install_signal_handler();

    if config.schedule.enabled {
        let audience = parse_audience(&config)?;
        let send_delay = Duration::from_millis(config.schedule.send_delay_ms);

        let broadcast = CheckinBroadcast::new(
            engine.clone(),
            channel.clone(),
            directory.clone(),
            repository.clone(),
            audience,
            send_delay,
        );
        let checkin_tick = CronTick::new(&config.schedule.checkin_cron)?;
        let checkin_cancel = cancel.clone();
        tokio::spawn(async move { broadcast.run(checkin_tick, checkin_cancel).await });

        let reminder = ReminderBroadcast::new(
            engine.clone(),
            channel.clone(),
            directory.clone(),
            repository.clone(),
            audience,
            send_delay,
        );
        let reminder_tick = CronTick::new(&config.schedule.reminder_cron)?;
        let reminder_cancel = cancel.clone();
        tokio::spawn(async move { reminder.run(reminder_tick, reminder_cancel).await });

        info!(
            checkin = %config.schedule.checkin_cron,
            reminder = %config.schedule.reminder_cron,
            audience = %config.schedule.audience,
            "schedulers started"
        );
    } else {
        info!("schedulers disabled by configuration");
    }

    info!("waggle is ready");

    let mut sweep = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    sweep.tick().await;

    loop {
        tokio::select! {
            _ = sweep.tick() => {
                let swept = engine.sessions().sweep_expired();
                if swept > 0 {
                    info!(count = swept, "expired stale sessions");
                }
            }
            _ = cancel.cancelled() => {
                info!("shutdown requested, stopping event loop");
                break;
            }
            event = channel.next_event() => {
                match event {
                    Ok(event) => {
                        let user = event.user.clone();
                        if let Err(error) = engine.handle_event(event).await {
                            error!(user = %user, %error, "event handling failed");
                            if let Err(send_error) =
                                channel.send(messages::generic_failure(&user)).await
                            {
                                warn!(user = %user, error = %send_error,
                                    "failed to notify user of the failure");
                            }
                        }
                    }
                    Err(error) => {
                        error!(%error, "inbound event stream closed");
                        break;
                    }
                }
            }
        }
    }

    shutdown::report_abandoned_sessions(engine.sessions());
    channel.shutdown().await?;
    storage.close().await?;
    info!("waggle stopped");
    Ok(())
}
