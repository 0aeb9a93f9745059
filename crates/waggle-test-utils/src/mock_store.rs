// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory repository and directory doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use waggle_core::{
    AuditEvent, AuditLogEntry, ResponseFilter, ResponseRepository, User, UserDirectory, UserId,
    WaggleError, WeekStart, WeeklyResponse,
};

/// In-memory [`ResponseRepository`] and [`UserDirectory`] keyed the same
/// way the SQLite backend is: responses by (user, week), users by id.
#[derive(Default)]
pub struct MockStore {
    responses: Mutex<HashMap<(String, String), WeeklyResponse>>,
    users: Mutex<HashMap<String, User>>,
    audit: Mutex<Vec<AuditLogEntry>>,
    audit_seq: AtomicI64,
    fail_writes: AtomicBool,
    fail_audit: AtomicBool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make response writes fail until cleared.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make audit appends fail until cleared.
    pub fn set_fail_audit(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    pub fn response(&self, user: &UserId, week: WeekStart) -> Option<WeeklyResponse> {
        self.responses
            .lock()
            .unwrap()
            .get(&(user.0.clone(), week.to_string()))
            .cloned()
    }

    pub fn response_count(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    pub fn audit_actions(&self) -> Vec<String> {
        self.audit
            .lock()
            .unwrap()
            .iter()
            .map(|entry| entry.action.clone())
            .collect()
    }

    pub fn user(&self, user: &UserId) -> Option<User> {
        self.users.lock().unwrap().get(&user.0).cloned()
    }

    /// Insert a user record directly, bypassing `ensure_user`.
    pub fn seed_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.user_id.0.clone(), user);
    }

    /// A plain active user record for seeding.
    pub fn make_user(id: &str, display_name: Option<&str>) -> User {
        let now = Utc::now().to_rfc3339();
        User {
            user_id: UserId(id.into()),
            display_name: display_name.map(str::to_string),
            email: None,
            is_active: true,
            opted_out: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn check_write(&self) -> Result<(), WaggleError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(WaggleError::Storage {
                source: "scripted write failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ResponseRepository for MockStore {
    async fn upsert_weekly_response(
        &self,
        response: &WeeklyResponse,
    ) -> Result<(), WaggleError> {
        self.check_write()?;
        let mut stored = response.clone();
        let now = Utc::now().to_rfc3339();
        stored.updated_at = now.clone();
        let key = (response.user_id.0.clone(), response.week_start.to_string());
        let mut responses = self.responses.lock().unwrap();
        stored.created_at = responses
            .get(&key)
            .map(|existing| existing.created_at.clone())
            .unwrap_or(now);
        responses.insert(key, stored);
        Ok(())
    }

    async fn find_responses(
        &self,
        filter: &ResponseFilter,
    ) -> Result<Vec<WeeklyResponse>, WaggleError> {
        let responses = self.responses.lock().unwrap();
        let mut matched: Vec<_> = responses
            .values()
            .filter(|r| filter.week_start.is_none_or(|w| r.week_start == w))
            .filter(|r| filter.user_id.as_ref().is_none_or(|u| &r.user_id == u))
            .filter(|r| filter.participated.is_none_or(|p| r.participated == p))
            .filter(|r| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|c| r.categories.contains(c))
            })
            .filter(|r| filter.tool.as_ref().is_none_or(|t| r.tools.contains(t)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        if let Some(limit) = filter.limit {
            matched.truncate(limit.max(0) as usize);
        }
        Ok(matched)
    }

    async fn has_response(
        &self,
        user_id: &UserId,
        week: WeekStart,
    ) -> Result<bool, WaggleError> {
        Ok(self
            .responses
            .lock()
            .unwrap()
            .contains_key(&(user_id.0.clone(), week.to_string())))
    }

    async fn append_audit_event(&self, event: &AuditEvent) -> Result<(), WaggleError> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(WaggleError::Storage {
                source: "scripted audit failure".into(),
            });
        }
        let id = self.audit_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.audit.lock().unwrap().push(AuditLogEntry {
            id,
            action: event.action.clone(),
            user_id: event.user_id.clone(),
            details: event.details.clone(),
            created_at: Utc::now().to_rfc3339(),
        });
        Ok(())
    }

    async fn recent_audit_events(
        &self,
        limit: i64,
    ) -> Result<Vec<AuditLogEntry>, WaggleError> {
        let audit = self.audit.lock().unwrap();
        Ok(audit.iter().rev().take(limit.max(0) as usize).cloned().collect())
    }
}

#[async_trait]
impl UserDirectory for MockStore {
    async fn ensure_user(
        &self,
        user_id: &UserId,
        display_name: Option<&str>,
    ) -> Result<User, WaggleError> {
        self.check_write()?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .entry(user_id.0.clone())
            .or_insert_with(|| Self::make_user(&user_id.0, display_name));
        if let Some(name) = display_name {
            user.display_name = Some(name.to_string());
            user.updated_at = Utc::now().to_rfc3339();
        }
        Ok(user.clone())
    }

    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, WaggleError> {
        Ok(self.users.lock().unwrap().get(&user_id.0).cloned())
    }

    async fn set_opted_out(
        &self,
        user_id: &UserId,
        opted_out: bool,
    ) -> Result<(), WaggleError> {
        self.check_write()?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .entry(user_id.0.clone())
            .or_insert_with(|| Self::make_user(&user_id.0, None));
        user.opted_out = opted_out;
        user.updated_at = Utc::now().to_rfc3339();
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, WaggleError> {
        let mut users: Vec<_> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by(|a, b| a.user_id.0.cmp(&b.user_id.0));
        Ok(users)
    }

    async fn list_active_users(&self) -> Result<Vec<User>, WaggleError> {
        let users = self.list_users().await?;
        Ok(users
            .into_iter()
            .filter(|user| user.is_active && !user.opted_out)
            .collect())
    }
}
