// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage-facing traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use waggle_config::model::StorageConfig;
use waggle_core::types::{
    AuditEvent, AuditLogEntry, ResponseFilter, User, UserId, WeekStart, WeeklyResponse,
};
use waggle_core::{
    AdapterType, HealthStatus, PluginAdapter, ResponseRepository, StorageAdapter, UserDirectory,
    WaggleError,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`]
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, WaggleError> {
        self.db.get().ok_or_else(|| WaggleError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WaggleError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WaggleError> {
        // Shutdown delegates to close if the DB was initialized.
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), WaggleError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| WaggleError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), WaggleError> {
        self.db()?.close().await
    }
}

#[async_trait]
impl ResponseRepository for SqliteStorage {
    async fn upsert_weekly_response(
        &self,
        response: &WeeklyResponse,
    ) -> Result<(), WaggleError> {
        queries::responses::upsert_weekly_response(self.db()?, response).await
    }

    async fn find_responses(
        &self,
        filter: &ResponseFilter,
    ) -> Result<Vec<WeeklyResponse>, WaggleError> {
        queries::responses::find_responses(self.db()?, filter).await
    }

    async fn has_response(
        &self,
        user_id: &UserId,
        week: WeekStart,
    ) -> Result<bool, WaggleError> {
        queries::responses::has_response(self.db()?, user_id, week).await
    }

    async fn append_audit_event(&self, event: &AuditEvent) -> Result<(), WaggleError> {
        queries::audit::append_audit_event(self.db()?, event).await
    }

    async fn recent_audit_events(
        &self,
        limit: i64,
    ) -> Result<Vec<AuditLogEntry>, WaggleError> {
        queries::audit::recent_audit_events(self.db()?, limit).await
    }
}

#[async_trait]
impl UserDirectory for SqliteStorage {
    async fn ensure_user(
        &self,
        user_id: &UserId,
        display_name: Option<&str>,
    ) -> Result<User, WaggleError> {
        queries::users::ensure_user(self.db()?, user_id, display_name).await
    }

    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, WaggleError> {
        queries::users::get_user(self.db()?, user_id).await
    }

    async fn set_opted_out(
        &self,
        user_id: &UserId,
        opted_out: bool,
    ) -> Result<(), WaggleError> {
        queries::users::set_opted_out(self.db()?, user_id, opted_out).await
    }

    async fn list_users(&self) -> Result<Vec<User>, WaggleError> {
        queries::users::list_users(self.db()?).await
    }

    async fn list_active_users(&self) -> Result<Vec<User>, WaggleError> {
        queries::users::list_active_users(self.db()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        let result = storage.initialize().await;
        assert!(result.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn health_check_fails_when_not_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        let result = storage.health_check().await;
        assert!(result.is_err(), "health_check should fail before initialize");
    }

    #[tokio::test]
    async fn full_response_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        let uid = UserId("U1".into());
        let user = storage.ensure_user(&uid, Some("Dana")).await.unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Dana"));

        let week = WeekStart::current();
        let mut response = WeeklyResponse::new(uid.clone(), week, true);
        response.categories = vec!["research".into()];
        response.tools = vec!["claude".into()];
        storage.upsert_weekly_response(&response).await.unwrap();

        assert!(storage.has_response(&uid, week).await.unwrap());

        let found = storage
            .find_responses(&ResponseFilter {
                user_id: Some(uid.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].categories, vec!["research"]);

        storage
            .append_audit_event(&AuditEvent::for_user("weekly_response_saved", uid))
            .await
            .unwrap();
        let audit = storage.recent_audit_events(1).await.unwrap();
        assert_eq!(audit[0].action, "weekly_response_saved");

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn health_check_returns_healthy_when_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        let status = storage.health_check().await.unwrap();
        assert_eq!(status, HealthStatus::Healthy);
    }
}
