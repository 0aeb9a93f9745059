// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The questionnaire engine.
//!
//! One engine instance handles all users; per-user state lives in the
//! [`SessionStore`]. Transitions follow a strict order: the next prompt
//! is sent first and the session only advances after the send succeeds,
//! so a delivery failure leaves the user exactly where they were.
//!
//! Finalization is ordered upsert, closing message, session removal,
//! audit. The upsert is keyed by (user, week), which makes retried
//! terminal transitions replace rather than duplicate.

use std::sync::Arc;

use tracing::{info, warn};
use waggle_core::{
    ActionEvent, AuditEvent, ChannelAdapter, EventKind, InboundEvent, ResponseRepository,
    UserDirectory, UserId, WaggleError, WeekStart, WeeklyResponse,
};

use crate::catalog;
use crate::messages;
use crate::router::{self, Intent};
use crate::session::{Session, Step};
use crate::store::SessionStore;

pub struct CheckinEngine {
    channel: Arc<dyn ChannelAdapter>,
    repository: Arc<dyn ResponseRepository>,
    directory: Arc<dyn UserDirectory>,
    sessions: SessionStore,
}

impl CheckinEngine {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        repository: Arc<dyn ResponseRepository>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            channel,
            repository,
            directory,
            sessions: SessionStore::new(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Open a check-in by sending the participation prompt.
    ///
    /// Returns `Ok(false)` without sending anything when the user already
    /// has a session in flight; the existing questionnaire wins.
    pub async fn start_checkin(
        &self,
        user: &UserId,
        display_name: Option<&str>,
    ) -> Result<bool, WaggleError> {
        if self.sessions.contains(user) {
            info!(user = %user, "check-in already in progress, skipping");
            return Ok(false);
        }

        let record = self.directory.ensure_user(user, display_name).await?;
        let name = record.display_name.as_deref().or(display_name);
        self.channel
            .send(messages::participation_prompt(user, name))
            .await?;
        self.sessions
            .insert(Session::new(user.clone(), WeekStart::current()));

        info!(user = %user, "check-in prompt sent");
        self.audit(AuditEvent::for_user("checkin_prompted", user.clone()))
            .await;
        Ok(true)
    }

    /// Send the mid-week reminder nudge. Does not open a session; the
    /// user's button click does that.
    pub async fn send_reminder(
        &self,
        user: &UserId,
        display_name: Option<&str>,
    ) -> Result<(), WaggleError> {
        self.channel
            .send(messages::reminder_prompt(user, display_name))
            .await?;
        info!(user = %user, "reminder sent");
        Ok(())
    }

    /// Dispatch one inbound event.
    pub async fn handle_event(&self, event: InboundEvent) -> Result<(), WaggleError> {
        match event.kind {
            EventKind::Message(text) => {
                self.handle_message(&event.user, event.display_name.as_deref(), &text)
                    .await
            }
            EventKind::Action(action) => {
                self.handle_action(&event.user, event.display_name.as_deref(), action)
                    .await
            }
            EventKind::Command { name, text } => {
                self.handle_command(&event.user, event.display_name.as_deref(), &name, &text)
                    .await
            }
        }
    }

    async fn handle_message(
        &self,
        user: &UserId,
        display_name: Option<&str>,
        text: &str,
    ) -> Result<(), WaggleError> {
        let record = self.directory.ensure_user(user, display_name).await?;
        let intent = router::route(text);

        if record.opted_out && intent != Intent::OptIn {
            self.channel.send(messages::opted_out_notice(user)).await?;
            return Ok(());
        }

        match intent {
            Intent::Help => {
                self.channel.send(messages::help(user)).await?;
                self.audit(AuditEvent::for_user("help_command", user.clone()))
                    .await;
            }
            Intent::OptOut => {
                self.directory.set_opted_out(user, true).await?;
                self.sessions.remove(user);
                self.channel
                    .send(messages::opt_out_confirmation(user))
                    .await?;
                info!(user = %user, "user opted out");
                self.audit(AuditEvent::for_user("opt_out", user.clone())).await;
            }
            Intent::OptIn => {
                self.directory.set_opted_out(user, false).await?;
                self.channel
                    .send(messages::opt_in_confirmation(user))
                    .await?;
                info!(user = %user, "user opted in");
                self.audit(AuditEvent::for_user("opt_in", user.clone())).await;
            }
            Intent::Restart => {
                self.sessions.remove(user);
                self.start_checkin(user, display_name).await?;
            }
            Intent::StartCheckin => {
                self.start_checkin(user, display_name).await?;
            }
        }
        Ok(())
    }

    async fn handle_command(
        &self,
        user: &UserId,
        display_name: Option<&str>,
        name: &str,
        text: &str,
    ) -> Result<(), WaggleError> {
        self.audit(
            AuditEvent::for_user("slash_command", user.clone())
                .with_details(serde_json::json!({ "command": name, "text": text })),
        )
        .await;

        match name {
            "waggle" => {
                self.directory.ensure_user(user, display_name).await?;
                self.start_checkin(user, display_name).await?;
            }
            _ => {
                // waggle-help, app mentions, and anything unrecognized.
                self.channel.send(messages::help(user)).await?;
            }
        }
        Ok(())
    }

    async fn handle_action(
        &self,
        user: &UserId,
        display_name: Option<&str>,
        action: ActionEvent,
    ) -> Result<(), WaggleError> {
        match action {
            ActionEvent::ParticipationYes => {
                self.handle_participation_yes(user, display_name).await
            }
            ActionEvent::ParticipationNo => {
                self.handle_participation_no(user, display_name).await
            }
            ActionEvent::CategoriesSelected(mut categories) => {
                // Interaction payloads are client-supplied; only known
                // catalog ids land in the draft.
                categories.retain(|id| catalog::category_by_id(id).is_some());
                self.record_selection(user, |session| session.draft.categories = categories)
                    .await
            }
            ActionEvent::ToolsSelected(mut tools) => {
                tools.retain(|id| catalog::tool_by_id(id).is_some());
                self.record_selection(user, |session| session.draft.tools = tools)
                    .await
            }
            ActionEvent::CategoriesNext => self.handle_categories_next(user).await,
            ActionEvent::ToolsNext { other_tool } => {
                self.handle_tools_next(user, other_tool).await
            }
            ActionEvent::DetailsSubmit(details) => {
                self.handle_finalize(user, details).await
            }
            ActionEvent::DetailsSkip => self.handle_finalize(user, None).await,
        }
    }

    async fn handle_participation_yes(
        &self,
        user: &UserId,
        display_name: Option<&str>,
    ) -> Result<(), WaggleError> {
        match self.sessions.get(user) {
            Some(session) if session.step != Step::AwaitingParticipation => {
                // Duplicate delivery after the flow already moved on.
                info!(user = %user, step = %session.step, "ignoring repeated yes");
                Ok(())
            }
            existing => {
                // A yes with no session (reminder button after restart)
                // opens one directly at category selection.
                self.channel.send(messages::category_prompt(user)).await?;
                let mut session = match existing {
                    Some(session) => session,
                    None => {
                        self.directory.ensure_user(user, display_name).await?;
                        Session::new(user.clone(), WeekStart::current())
                    }
                };
                session.draft.participated = true;
                session.advance(Step::CategorySelection);
                self.sessions.insert(session);
                info!(user = %user, "participation confirmed");
                Ok(())
            }
        }
    }

    async fn handle_participation_no(
        &self,
        user: &UserId,
        display_name: Option<&str>,
    ) -> Result<(), WaggleError> {
        let week = self
            .sessions
            .get(user)
            .map(|session| session.week)
            .unwrap_or_else(WeekStart::current);

        // The response row references the users table, so the sender
        // must exist there even when the prompt outlived their row.
        self.directory.ensure_user(user, display_name).await?;
        let response = WeeklyResponse::new(user.clone(), week, false);
        self.repository.upsert_weekly_response(&response).await?;
        self.channel.send(messages::no_response_ack(user)).await?;
        self.sessions.remove(user);

        info!(user = %user, week = %week, "non-participation recorded");
        self.audit(
            AuditEvent::for_user("weekly_response_no", user.clone())
                .with_details(serde_json::json!({ "week_start": week.to_string() })),
        )
        .await;
        Ok(())
    }

    /// Checkbox state changed. The platform sends the full current
    /// selection each time, so this is a plain overwrite.
    async fn record_selection<F>(&self, user: &UserId, apply: F) -> Result<(), WaggleError>
    where
        F: FnOnce(&mut Session),
    {
        if !self.sessions.update(user, apply) {
            warn!(user = %user, "selection received without a session");
            self.channel.send(messages::session_expired(user)).await?;
        }
        Ok(())
    }

    async fn handle_categories_next(&self, user: &UserId) -> Result<(), WaggleError> {
        let Some(session) = self.sessions.get(user) else {
            self.channel.send(messages::session_expired(user)).await?;
            return Ok(());
        };
        if session.step != Step::CategorySelection {
            info!(user = %user, step = %session.step, "ignoring repeated next");
            return Ok(());
        }
        if session.draft.categories.is_empty() {
            self.channel
                .send(messages::select_category_warning(user))
                .await?;
            return Ok(());
        }

        self.channel.send(messages::tool_prompt(user)).await?;
        self.sessions
            .update(user, |session| session.advance(Step::ToolSelection));
        Ok(())
    }

    async fn handle_tools_next(
        &self,
        user: &UserId,
        other_tool: Option<String>,
    ) -> Result<(), WaggleError> {
        let Some(session) = self.sessions.get(user) else {
            self.channel.send(messages::session_expired(user)).await?;
            return Ok(());
        };
        if session.step != Step::ToolSelection {
            info!(user = %user, step = %session.step, "ignoring repeated next");
            return Ok(());
        }
        if session.draft.tools.is_empty() {
            self.channel.send(messages::select_tool_warning(user)).await?;
            return Ok(());
        }

        self.channel.send(messages::details_prompt(user)).await?;
        self.sessions.update(user, |session| {
            if let Some(name) = other_tool
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
            {
                if !session.draft.custom_tools.iter().any(|t| t == name) {
                    session.draft.custom_tools.push(name.to_string());
                }
            }
            session.advance(Step::CustomDetails);
        });
        Ok(())
    }

    async fn handle_finalize(
        &self,
        user: &UserId,
        details: Option<String>,
    ) -> Result<(), WaggleError> {
        let Some(session) = self.sessions.get(user) else {
            self.channel.send(messages::session_expired(user)).await?;
            return Ok(());
        };
        if session.step != Step::CustomDetails {
            info!(user = %user, step = %session.step, "ignoring premature submit");
            return Ok(());
        }

        let mut response =
            WeeklyResponse::new(user.clone(), session.week, session.draft.participated);
        response.categories = session.draft.categories.clone();
        response.tools = session.draft.tools.clone();
        response.custom_tools = session.draft.custom_tools.clone();
        response.custom_details = details
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        // Persist first. A failed upsert keeps the session so the user
        // can hit submit again.
        self.repository.upsert_weekly_response(&response).await?;
        self.channel.send(messages::thank_you(user)).await?;
        self.sessions.remove(user);

        info!(
            user = %user,
            week = %session.week,
            categories = response.categories.len(),
            tools = response.tools.len(),
            "weekly response saved"
        );
        self.audit(
            AuditEvent::for_user("weekly_response_saved", user.clone()).with_details(
                serde_json::json!({
                    "week_start": session.week.to_string(),
                    "categories": response.categories,
                    "tools": response.tools,
                }),
            ),
        )
        .await;
        Ok(())
    }

    /// Best-effort audit append. Storage trouble must never surface in a
    /// user-facing flow.
    async fn audit(&self, event: AuditEvent) {
        if let Err(error) = self.repository.append_audit_event(&event).await {
            warn!(action = %event.action, %error, "audit append failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waggle_test_utils::{MockChannel, MockStore};

    fn user() -> UserId {
        UserId("U100".into())
    }

    fn engine() -> (Arc<MockChannel>, Arc<MockStore>, CheckinEngine) {
        let channel = Arc::new(MockChannel::new());
        let store = Arc::new(MockStore::new());
        let engine = CheckinEngine::new(channel.clone(), store.clone(), store.clone());
        (channel, store, engine)
    }

    fn action(user: &UserId, action: ActionEvent) -> InboundEvent {
        InboundEvent {
            id: format!("evt-{}", rand_suffix()),
            user: user.clone(),
            display_name: None,
            kind: EventKind::Action(action),
        }
    }

    fn message(user: &UserId, text: &str) -> InboundEvent {
        InboundEvent {
            id: format!("evt-{}", rand_suffix()),
            user: user.clone(),
            display_name: Some("Ada".into()),
            kind: EventKind::Message(text.into()),
        }
    }

    fn rand_suffix() -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT: AtomicU64 = AtomicU64::new(0);
        NEXT.fetch_add(1, Ordering::Relaxed)
    }

    async fn run_to_details(engine: &CheckinEngine, user: &UserId) {
        engine.start_checkin(user, Some("Ada")).await.unwrap();
        engine
            .handle_event(action(user, ActionEvent::ParticipationYes))
            .await
            .unwrap();
        engine
            .handle_event(action(
                user,
                ActionEvent::CategoriesSelected(vec!["code_generation".into()]),
            ))
            .await
            .unwrap();
        engine
            .handle_event(action(user, ActionEvent::CategoriesNext))
            .await
            .unwrap();
        engine
            .handle_event(action(
                user,
                ActionEvent::ToolsSelected(vec!["claude".into(), "other_tool".into()]),
            ))
            .await
            .unwrap();
        engine
            .handle_event(action(
                user,
                ActionEvent::ToolsNext {
                    other_tool: Some("  Ollama ".into()),
                },
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn full_flow_records_response_and_clears_session() {
        let (channel, store, engine) = engine();
        let user = user();

        run_to_details(&engine, &user).await;
        engine
            .handle_event(action(
                &user,
                ActionEvent::DetailsSubmit(Some("Built a RAG prototype".into())),
            ))
            .await
            .unwrap();

        let saved = store.response(&user, WeekStart::current()).unwrap();
        assert!(saved.participated);
        assert_eq!(saved.categories, vec!["code_generation"]);
        assert_eq!(saved.tools, vec!["claude", "other_tool"]);
        assert_eq!(saved.custom_tools, vec!["Ollama"]);
        assert_eq!(saved.custom_details.as_deref(), Some("Built a RAG prototype"));

        assert!(engine.sessions().get(&user).is_none());
        let last = channel.sent_to(&user).last().cloned().unwrap();
        assert!(last.text.contains("recorded in the hive"));
        assert!(store
            .audit_actions()
            .contains(&"weekly_response_saved".to_string()));
    }

    #[tokio::test]
    async fn start_is_a_no_op_while_a_session_is_open() {
        let (channel, _, engine) = engine();
        let user = user();

        assert!(engine.start_checkin(&user, None).await.unwrap());
        assert!(!engine.start_checkin(&user, None).await.unwrap());
        assert_eq!(channel.sent_to(&user).len(), 1);
    }

    #[tokio::test]
    async fn no_button_records_non_participation_without_a_session() {
        let (channel, store, engine) = engine();
        let user = user();

        engine
            .handle_event(action(&user, ActionEvent::ParticipationNo))
            .await
            .unwrap();

        let saved = store.response(&user, WeekStart::current()).unwrap();
        assert!(!saved.participated);
        assert!(saved.categories.is_empty());
        assert!(channel.sent_to(&user)[0].text.contains("totally fine"));
        assert!(store
            .audit_actions()
            .contains(&"weekly_response_no".to_string()));
    }

    #[tokio::test]
    async fn yes_without_a_session_opens_one_at_category_selection() {
        let (channel, _, engine) = engine();
        let user = user();

        engine
            .handle_event(action(&user, ActionEvent::ParticipationYes))
            .await
            .unwrap();

        let session = engine.sessions().get(&user).unwrap();
        assert_eq!(session.step, Step::CategorySelection);
        assert!(session.draft.participated);
        assert!(channel.sent_to(&user)[0].text.contains("What category"));
    }

    #[tokio::test]
    async fn next_without_selection_warns_and_stays_put() {
        let (channel, _, engine) = engine();
        let user = user();

        engine.start_checkin(&user, None).await.unwrap();
        engine
            .handle_event(action(&user, ActionEvent::ParticipationYes))
            .await
            .unwrap();
        engine
            .handle_event(action(&user, ActionEvent::CategoriesNext))
            .await
            .unwrap();

        assert_eq!(
            engine.sessions().get(&user).unwrap().step,
            Step::CategorySelection
        );
        let last = channel.sent_to(&user).last().cloned().unwrap();
        assert!(last.text.contains("at least one category"));
    }

    #[tokio::test]
    async fn tools_next_without_selection_warns() {
        let (channel, _, engine) = engine();
        let user = user();

        engine.start_checkin(&user, None).await.unwrap();
        engine
            .handle_event(action(&user, ActionEvent::ParticipationYes))
            .await
            .unwrap();
        engine
            .handle_event(action(
                &user,
                ActionEvent::CategoriesSelected(vec!["other".into()]),
            ))
            .await
            .unwrap();
        engine
            .handle_event(action(&user, ActionEvent::CategoriesNext))
            .await
            .unwrap();
        engine
            .handle_event(action(&user, ActionEvent::ToolsNext { other_tool: None }))
            .await
            .unwrap();

        assert_eq!(
            engine.sessions().get(&user).unwrap().step,
            Step::ToolSelection
        );
        let last = channel.sent_to(&user).last().cloned().unwrap();
        assert!(last.text.contains("at least one tool"));
    }

    #[tokio::test]
    async fn stray_action_reports_expired_session() {
        let (channel, store, engine) = engine();
        let user = user();

        engine
            .handle_event(action(&user, ActionEvent::CategoriesNext))
            .await
            .unwrap();

        assert!(channel.sent_to(&user)[0].text.contains("session has expired"));
        assert_eq!(store.response_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_submit_after_finalize_does_not_duplicate() {
        let (channel, store, engine) = engine();
        let user = user();

        run_to_details(&engine, &user).await;
        engine
            .handle_event(action(&user, ActionEvent::DetailsSkip))
            .await
            .unwrap();
        engine
            .handle_event(action(&user, ActionEvent::DetailsSkip))
            .await
            .unwrap();

        assert_eq!(store.response_count(), 1);
        let last = channel.sent_to(&user).last().cloned().unwrap();
        assert!(last.text.contains("session has expired"));
    }

    #[tokio::test]
    async fn failed_upsert_keeps_the_session_for_retry() {
        let (_, store, engine) = engine();
        let user = user();

        run_to_details(&engine, &user).await;
        store.set_fail_writes(true);
        let result = engine
            .handle_event(action(&user, ActionEvent::DetailsSkip))
            .await;
        assert!(result.is_err());
        assert!(engine.sessions().get(&user).is_some());

        store.set_fail_writes(false);
        engine
            .handle_event(action(&user, ActionEvent::DetailsSkip))
            .await
            .unwrap();
        assert_eq!(store.response_count(), 1);
        assert!(engine.sessions().get(&user).is_none());
    }

    #[tokio::test]
    async fn failed_prompt_send_leaves_no_session_behind() {
        let (channel, _, engine) = engine();
        let user = user();

        channel.fail_sends_to(&user);
        assert!(engine.start_checkin(&user, None).await.is_err());
        assert!(engine.sessions().get(&user).is_none());
    }

    #[tokio::test]
    async fn opt_out_blocks_checkins_until_opt_in() {
        let (channel, store, engine) = engine();
        let user = user();

        engine.start_checkin(&user, Some("Ada")).await.unwrap();
        engine
            .handle_event(message(&user, "please opt out"))
            .await
            .unwrap();

        assert!(store.user(&user).unwrap().opted_out);
        assert!(engine.sessions().get(&user).is_none());

        engine.handle_event(message(&user, "hi")).await.unwrap();
        let last = channel.sent_to(&user).last().cloned().unwrap();
        assert!(last.text.contains("opted out"));

        engine.handle_event(message(&user, "opt in")).await.unwrap();
        assert!(!store.user(&user).unwrap().opted_out);
        let actions = store.audit_actions();
        assert!(actions.contains(&"opt_out".to_string()));
        assert!(actions.contains(&"opt_in".to_string()));
    }

    #[tokio::test]
    async fn restart_clears_and_reprompts() {
        let (channel, _, engine) = engine();
        let user = user();

        run_to_details(&engine, &user).await;
        engine.handle_event(message(&user, "restart")).await.unwrap();

        let session = engine.sessions().get(&user).unwrap();
        assert_eq!(session.step, Step::AwaitingParticipation);
        assert!(session.draft.categories.is_empty());
        let last = channel.sent_to(&user).last().cloned().unwrap();
        assert!(last.text.contains("weekly AI check-in"));
    }

    #[tokio::test]
    async fn help_message_and_unknown_command() {
        let (channel, store, engine) = engine();
        let user = user();

        engine
            .handle_event(message(&user, "what can you do"))
            .await
            .unwrap();
        assert!(channel.sent_to(&user)[0].text.contains("Waggle Help"));

        engine
            .handle_event(InboundEvent {
                id: "evt-cmd".into(),
                user: user.clone(),
                display_name: None,
                kind: EventKind::Command {
                    name: "waggle-help".into(),
                    text: String::new(),
                },
            })
            .await
            .unwrap();
        let last = channel.sent_to(&user).last().cloned().unwrap();
        assert!(last.text.contains("Waggle Help"));
        assert!(store
            .audit_actions()
            .contains(&"slash_command".to_string()));
    }

    #[tokio::test]
    async fn free_text_message_registers_user_and_starts_checkin() {
        let (channel, store, engine) = engine();
        let user = user();

        engine.handle_event(message(&user, "hello")).await.unwrap();

        let record = store.user(&user).unwrap();
        assert_eq!(record.display_name.as_deref(), Some("Ada"));
        let prompt = &channel.sent_to(&user)[0];
        assert!(prompt.blocks.as_ref().unwrap().to_string().contains("Hey Ada!"));
        assert!(engine.sessions().contains(&user));
    }

    #[tokio::test]
    async fn audit_failure_does_not_break_the_flow() {
        let (_, store, engine) = engine();
        let user = user();

        store.set_fail_audit(true);
        run_to_details(&engine, &user).await;
        engine
            .handle_event(action(&user, ActionEvent::DetailsSkip))
            .await
            .unwrap();

        assert_eq!(store.response_count(), 1);
        assert!(store.audit_actions().is_empty());
    }

    #[tokio::test]
    async fn no_click_registers_unknown_user_before_recording() {
        let (_, store, engine) = engine();
        let user = user();

        // No start_checkin and no directory row beforehand.
        engine
            .handle_event(action(&user, ActionEvent::ParticipationNo))
            .await
            .unwrap();

        assert!(store.user(&user).is_some());
        let response = store.response(&user, WeekStart::current()).unwrap();
        assert!(!response.participated);
    }

    #[tokio::test]
    async fn unknown_selection_ids_are_dropped() {
        let (_, store, engine) = engine();
        let user = user();

        engine.start_checkin(&user, None).await.unwrap();
        engine
            .handle_event(action(&user, ActionEvent::ParticipationYes))
            .await
            .unwrap();
        engine
            .handle_event(action(
                &user,
                ActionEvent::CategoriesSelected(vec![
                    "code_generation".into(),
                    "not_a_category".into(),
                ]),
            ))
            .await
            .unwrap();
        engine
            .handle_event(action(&user, ActionEvent::CategoriesNext))
            .await
            .unwrap();
        engine
            .handle_event(action(
                &user,
                ActionEvent::ToolsSelected(vec!["claude".into(), "definitely_fake".into()]),
            ))
            .await
            .unwrap();
        engine
            .handle_event(action(&user, ActionEvent::ToolsNext { other_tool: None }))
            .await
            .unwrap();
        engine
            .handle_event(action(&user, ActionEvent::DetailsSkip))
            .await
            .unwrap();

        let response = store.response(&user, WeekStart::current()).unwrap();
        assert_eq!(response.categories, vec!["code_generation"]);
        assert_eq!(response.tools, vec!["claude"]);
    }
}
