// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent map of live sessions, one per user.

use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use waggle_core::UserId;

use crate::session::Session;

/// Sessions idle longer than this are dropped on the next sweep. The
/// questionnaire takes a minute or two; a day of silence means the user
/// walked away.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user: &UserId) -> Option<Session> {
        self.sessions.get(&user.0).map(|entry| entry.clone())
    }

    pub fn insert(&self, session: Session) {
        self.sessions.insert(session.user.0.clone(), session);
    }

    pub fn remove(&self, user: &UserId) -> Option<Session> {
        self.sessions.remove(&user.0).map(|(_, session)| session)
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.sessions.contains_key(&user.0)
    }

    /// Apply `f` to the user's session in place. Returns `false` when no
    /// session exists.
    pub fn update<F>(&self, user: &UserId, f: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        match self.sessions.get_mut(&user.0) {
            Some(mut entry) => {
                f(entry.value_mut());
                entry.touch();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle past [`SESSION_TTL`]. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(SESSION_TTL).unwrap_or(chrono::Duration::hours(24));
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.updated_at >= cutoff);
        before - self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Step;
    use waggle_core::WeekStart;

    fn user(id: &str) -> UserId {
        UserId(id.into())
    }

    #[test]
    fn insert_get_remove() {
        let store = SessionStore::new();
        assert!(store.get(&user("U1")).is_none());

        store.insert(Session::new(user("U1"), WeekStart::current()));
        assert!(store.contains(&user("U1")));
        assert_eq!(store.len(), 1);

        let removed = store.remove(&user("U1")).unwrap();
        assert_eq!(removed.user, user("U1"));
        assert!(store.is_empty());
    }

    #[test]
    fn update_mutates_in_place() {
        let store = SessionStore::new();
        store.insert(Session::new(user("U1"), WeekStart::current()));

        let updated = store.update(&user("U1"), |session| {
            session.draft.participated = true;
            session.step = Step::CategorySelection;
        });
        assert!(updated);

        let session = store.get(&user("U1")).unwrap();
        assert!(session.draft.participated);
        assert_eq!(session.step, Step::CategorySelection);
    }

    #[test]
    fn update_without_session_is_a_no_op() {
        let store = SessionStore::new();
        assert!(!store.update(&user("U1"), |session| {
            session.draft.participated = true;
        }));
    }

    #[test]
    fn sweep_drops_stale_sessions() {
        let store = SessionStore::new();
        let mut stale = Session::new(user("U1"), WeekStart::current());
        stale.updated_at = Utc::now() - chrono::Duration::hours(48);
        store.insert(stale);
        store.insert(Session::new(user("U2"), WeekStart::current()));

        assert_eq!(store.sweep_expired(), 1);
        assert!(store.get(&user("U1")).is_none());
        assert!(store.get(&user("U2")).is_some());
    }
}
