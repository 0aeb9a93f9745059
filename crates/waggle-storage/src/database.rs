// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use tracing::debug;
use waggle_core::WaggleError;

/// Async handle to the single SQLite connection.
///
/// Opening runs PRAGMAs and embedded migrations on a blocking thread before
/// the async connection is handed out, so a `Database` is always migrated.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations.
    pub async fn open(path: &str) -> Result<Self, WaggleError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| WaggleError::Storage {
                source: Box::new(e),
            })?;
        }

        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), WaggleError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(|e| WaggleError::Storage {
                    source: Box::new(e),
                })?;
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )
            .map_err(|e| WaggleError::Storage {
                source: Box::new(e),
            })?;
            crate::migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| WaggleError::Internal(format!("migration task panicked: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| map_tr_err(e.into()))?;

        // Session PRAGMAs apply per connection, so repeat them here.
        conn.call(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying async connection. All query modules go through this.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and release the connection.
    pub async fn close(&self) -> Result<(), WaggleError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the storage error variant.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> WaggleError {
    WaggleError::Storage {
        source: Box::new(e),
    }
}
