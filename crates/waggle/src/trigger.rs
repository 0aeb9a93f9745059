// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot operational commands: manual broadcast triggers and the
//! stats dump. These send via the Web API without starting the webhook
//! server, so they can run next to (or instead of) a live serve process.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use waggle_checkin::CheckinEngine;
use waggle_config::WaggleConfig;
use waggle_core::{
    ChannelAdapter, ResponseRepository, StorageAdapter, UserDirectory, WaggleError,
};
use waggle_cron::{BatchSummary, CheckinBroadcast, ReminderBroadcast};
use waggle_slack::SlackChannel;
use waggle_storage::SqliteStorage;

struct Wiring {
    storage: Arc<SqliteStorage>,
    channel: Arc<dyn ChannelAdapter>,
    repository: Arc<dyn ResponseRepository>,
    directory: Arc<dyn UserDirectory>,
    engine: Arc<CheckinEngine>,
}

async fn wire(config: &WaggleConfig) -> Result<Wiring, WaggleError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let channel: Arc<dyn ChannelAdapter> =
        Arc::new(SlackChannel::new(config.slack.clone())?);
    let repository: Arc<dyn ResponseRepository> = storage.clone();
    let directory: Arc<dyn UserDirectory> = storage.clone();
    let engine = Arc::new(CheckinEngine::new(
        channel.clone(),
        repository.clone(),
        directory.clone(),
    ));

    Ok(Wiring {
        storage,
        channel,
        repository,
        directory,
        engine,
    })
}

fn print_summary(kind: &str, summary: &BatchSummary) {
    println!(
        "{kind} for week {}: {} sent, {} skipped, {} errors (of {} targets)",
        summary.week,
        summary.success_count,
        summary.skipped_count,
        summary.error_count,
        summary.target_count
    );
}

pub async fn run_trigger_checkin(config: WaggleConfig) -> Result<(), WaggleError> {
    info!("manually triggering weekly check-ins");
    let audience = crate::serve::parse_audience(&config)?;
    let wiring = wire(&config).await?;

    let broadcast = CheckinBroadcast::new(
        wiring.engine.clone(),
        wiring.channel.clone(),
        wiring.directory.clone(),
        wiring.repository.clone(),
        audience,
        Duration::from_millis(config.schedule.send_delay_ms),
    );
    let summary = broadcast.run_once().await?;
    print_summary("check-in broadcast", &summary);

    wiring.storage.close().await?;
    Ok(())
}

pub async fn run_trigger_reminder(config: WaggleConfig) -> Result<(), WaggleError> {
    info!("manually triggering reminders");
    let audience = crate::serve::parse_audience(&config)?;
    let wiring = wire(&config).await?;

    let reminder = ReminderBroadcast::new(
        wiring.engine.clone(),
        wiring.channel.clone(),
        wiring.directory.clone(),
        wiring.repository.clone(),
        audience,
        Duration::from_millis(config.schedule.send_delay_ms),
    );
    let summary = reminder.run_once().await?;
    print_summary("reminder broadcast", &summary);

    wiring.storage.close().await?;
    Ok(())
}

pub async fn run_stats(config: WaggleConfig) -> Result<(), WaggleError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let stats = waggle_stats::dashboard_stats(storage.as_ref(), storage.as_ref()).await?;
    let rendered = serde_json::to_string_pretty(&stats)
        .map_err(|e| WaggleError::Internal(format!("failed to render stats: {e}")))?;
    println!("{rendered}");

    storage.close().await?;
    Ok(())
}
