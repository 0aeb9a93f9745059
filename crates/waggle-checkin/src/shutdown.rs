// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! SIGTERM and SIGINT cancel a [`CancellationToken`] that the serve loop
//! and the schedulers monitor. In-flight questionnaire sessions are not
//! persisted across restarts; they are counted and logged on the way out.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::store::SessionStore;

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal
/// is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Log sessions that will be dropped by the shutdown. Users restart with
/// the start command; nothing durable is lost.
pub fn report_abandoned_sessions(sessions: &SessionStore) {
    let count = sessions.len();
    if count == 0 {
        info!("no active sessions at shutdown");
    } else {
        warn!(count, "dropping in-flight check-in sessions");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use waggle_core::{UserId, WeekStart};

    #[tokio::test]
    async fn install_signal_handler_returns_token() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        // Cancel it manually to clean up the background task.
        token.cancel();
    }

    #[test]
    fn abandoned_session_report_counts() {
        let sessions = SessionStore::new();
        report_abandoned_sessions(&sessions);
        sessions.insert(Session::new(UserId("U1".into()), WeekStart::current()));
        report_abandoned_sessions(&sessions);
    }
}
