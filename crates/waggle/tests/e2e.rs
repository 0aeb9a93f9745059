// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end flows over real SQLite storage with a scripted channel.

use std::sync::Arc;
use std::time::Duration;

use waggle_checkin::CheckinEngine;
use waggle_config::model::StorageConfig;
use waggle_core::{
    ActionEvent, EventKind, InboundEvent, ResponseFilter, ResponseRepository, StorageAdapter,
    UserDirectory, UserId, WeekStart,
};
use waggle_cron::{AudienceSource, CheckinBroadcast, ReminderBroadcast};
use waggle_storage::SqliteStorage;
use waggle_test_utils::MockChannel;

struct Harness {
    _dir: tempfile::TempDir,
    channel: Arc<MockChannel>,
    storage: Arc<SqliteStorage>,
    engine: Arc<CheckinEngine>,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SqliteStorage::new(StorageConfig {
        database_path: dir
            .path()
            .join("waggle.db")
            .to_string_lossy()
            .into_owned(),
        wal_mode: true,
    }));
    storage.initialize().await.unwrap();

    let channel = Arc::new(MockChannel::new());
    let engine = Arc::new(CheckinEngine::new(
        channel.clone(),
        storage.clone(),
        storage.clone(),
    ));
    Harness {
        _dir: dir,
        channel,
        storage,
        engine,
    }
}

fn action(user: &str, action: ActionEvent) -> InboundEvent {
    InboundEvent {
        id: next_event_id(),
        user: UserId(user.into()),
        display_name: None,
        kind: EventKind::Action(action),
    }
}

fn next_event_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(0);
    format!("evt-{}", NEXT.fetch_add(1, Ordering::Relaxed))
}

async fn answer_yes_flow(engine: &CheckinEngine, user: &str, details: Option<&str>) {
    engine
        .handle_event(action(user, ActionEvent::ParticipationYes))
        .await
        .unwrap();
    engine
        .handle_event(action(
            user,
            ActionEvent::CategoriesSelected(vec!["prototyping".into()]),
        ))
        .await
        .unwrap();
    engine
        .handle_event(action(user, ActionEvent::CategoriesNext))
        .await
        .unwrap();
    engine
        .handle_event(action(user, ActionEvent::ToolsSelected(vec!["claude".into()])))
        .await
        .unwrap();
    engine
        .handle_event(action(user, ActionEvent::ToolsNext { other_tool: None }))
        .await
        .unwrap();
    engine
        .handle_event(action(
            user,
            ActionEvent::DetailsSubmit(details.map(str::to_string)),
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn full_questionnaire_persists_to_sqlite() {
    let h = harness().await;
    let user = UserId("U1".into());

    h.engine.start_checkin(&user, Some("Ada")).await.unwrap();
    answer_yes_flow(&h.engine, "U1", Some("shipped a prototype")).await;

    let week = WeekStart::current();
    let responses = h
        .storage
        .find_responses(&ResponseFilter {
            user_id: Some(user.clone()),
            week_start: Some(week),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(responses.len(), 1);
    let saved = &responses[0];
    assert!(saved.participated);
    assert_eq!(saved.categories, vec!["prototyping"]);
    assert_eq!(saved.tools, vec!["claude"]);
    assert_eq!(saved.custom_details.as_deref(), Some("shipped a prototype"));

    // The user was auto-registered on the way through.
    let record = h.storage.get_user(&user).await.unwrap().unwrap();
    assert_eq!(record.display_name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn answering_twice_in_one_week_keeps_one_row() {
    let h = harness().await;
    let user = UserId("U1".into());

    h.engine.start_checkin(&user, None).await.unwrap();
    answer_yes_flow(&h.engine, "U1", None).await;

    // Changed their mind later the same week.
    h.engine
        .handle_event(action("U1", ActionEvent::ParticipationNo))
        .await
        .unwrap();

    let responses = h
        .storage
        .find_responses(&ResponseFilter {
            user_id: Some(user),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(responses.len(), 1);
    assert!(!responses[0].participated);
}

#[tokio::test]
async fn broadcast_skips_responders_and_opted_out() {
    let h = harness().await;
    for id in ["U1", "U2", "U3"] {
        h.storage.ensure_user(&UserId(id.into()), None).await.unwrap();
    }
    h.storage
        .set_opted_out(&UserId("U3".into()), true)
        .await
        .unwrap();

    // U2 already answered this week.
    h.engine
        .handle_event(action("U2", ActionEvent::ParticipationNo))
        .await
        .unwrap();
    h.channel.clear_sent();

    let broadcast = CheckinBroadcast::new(
        h.engine.clone(),
        h.channel.clone(),
        h.storage.clone(),
        h.storage.clone(),
        AudienceSource::Directory,
        Duration::ZERO,
    );
    let summary = broadcast.run_once().await.unwrap();

    assert_eq!(summary.target_count, 1);
    assert_eq!(summary.success_count, 1);
    assert_eq!(h.channel.sent_to(&UserId("U1".into())).len(), 1);
    assert!(h.channel.sent_to(&UserId("U2".into())).is_empty());
    assert!(h.channel.sent_to(&UserId("U3".into())).is_empty());
}

#[tokio::test]
async fn reminder_then_yes_button_completes_the_flow() {
    let h = harness().await;
    h.storage.ensure_user(&UserId("U1".into()), None).await.unwrap();

    let reminder = ReminderBroadcast::new(
        h.engine.clone(),
        h.channel.clone(),
        h.storage.clone(),
        h.storage.clone(),
        AudienceSource::Directory,
        Duration::ZERO,
    );
    reminder.run_once().await.unwrap();
    assert!(h.engine.sessions().is_empty());

    // Button on the reminder opens the questionnaire directly.
    answer_yes_flow(&h.engine, "U1", None).await;
    assert!(h
        .storage
        .has_response(&UserId("U1".into()), WeekStart::current())
        .await
        .unwrap());
}

#[tokio::test]
async fn audit_log_captures_the_lifecycle() {
    let h = harness().await;
    let user = UserId("U1".into());

    h.engine.start_checkin(&user, None).await.unwrap();
    answer_yes_flow(&h.engine, "U1", None).await;

    let entries = h.storage.recent_audit_events(10).await.unwrap();
    let actions: Vec<_> = entries.iter().map(|e| e.action.as_str()).collect();
    assert!(actions.contains(&"checkin_prompted"));
    assert!(actions.contains(&"weekly_response_saved"));
}

#[tokio::test]
async fn no_click_from_unknown_user_still_records() {
    let h = harness().await;
    let user = UserId("U9".into());

    // No prior directory row; the response table's foreign key must
    // not reject the write.
    h.engine
        .handle_event(action("U9", ActionEvent::ParticipationNo))
        .await
        .unwrap();

    assert!(h
        .storage
        .has_response(&user, WeekStart::current())
        .await
        .unwrap());
    assert!(h.storage.get_user(&user).await.unwrap().is_some());
}

#[tokio::test]
async fn second_start_while_session_open_sends_nothing() {
    let h = harness().await;
    let user = UserId("U1".into());

    assert!(h.engine.start_checkin(&user, None).await.unwrap());
    assert!(!h.engine.start_checkin(&user, None).await.unwrap());
    assert_eq!(h.channel.sent_to(&user).len(), 1);
}

#[tokio::test]
async fn responses_are_keyed_by_week() {
    let h = harness().await;
    let user = UserId("U1".into());
    let this_week = WeekStart::current();
    let last_week = this_week.minus_weeks(1);

    // Backfill last week directly via the repository.
    let mut old = waggle_core::WeeklyResponse::new(user.clone(), last_week, true);
    old.categories = vec!["research".into()];
    h.storage.upsert_weekly_response(&old).await.unwrap();

    h.engine.start_checkin(&user, None).await.unwrap();
    answer_yes_flow(&h.engine, "U1", None).await;

    let all = h
        .storage
        .find_responses(&ResponseFilter {
            user_id: Some(user),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    let weeks: Vec<_> = all.iter().map(|r| r.week_start).collect();
    assert!(weeks.contains(&this_week));
    assert!(weeks.contains(&last_week));
}
