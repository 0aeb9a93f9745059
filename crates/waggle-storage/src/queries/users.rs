// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User directory CRUD operations.

use rusqlite::params;
use waggle_core::types::{User, UserId};
use waggle_core::WaggleError;

use crate::database::Database;

const USER_COLUMNS: &str =
    "user_id, display_name, email, is_active, opted_out, created_at, updated_at";

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: UserId(row.get(0)?),
        display_name: row.get(1)?,
        email: row.get(2)?,
        is_active: row.get::<_, i64>(3)? != 0,
        opted_out: row.get::<_, i64>(4)? != 0,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Fetch a user, creating the row on first contact.
///
/// A provided display name refreshes the stored one; `None` leaves it alone.
pub async fn ensure_user(
    db: &Database,
    user_id: &UserId,
    display_name: Option<&str>,
) -> Result<User, WaggleError> {
    let id = user_id.0.clone();
    let name = display_name.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (user_id, display_name) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET
                     display_name = COALESCE(excluded.display_name, users.display_name),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![id, name],
            )?;
            let user = conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
                params![id],
                row_to_user,
            )?;
            Ok(user)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a user by ID without creating one.
pub async fn get_user(db: &Database, user_id: &UserId) -> Result<Option<User>, WaggleError> {
    let id = user_id.0.clone();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
                params![id],
                row_to_user,
            );
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set or clear the opt-out flag, creating the row if needed.
pub async fn set_opted_out(
    db: &Database,
    user_id: &UserId,
    opted_out: bool,
) -> Result<(), WaggleError> {
    let id = user_id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (user_id, opted_out) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET
                     opted_out = excluded.opted_out,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![id, opted_out as i64],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all users, active or not.
pub async fn list_users(db: &Database) -> Result<Vec<User>, WaggleError> {
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY user_id"))?;
            let rows = stmt.query_map([], row_to_user)?;
            let mut users = Vec::new();
            for row in rows {
                users.push(row?);
            }
            Ok(users)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List active, non-opted-out users.
pub async fn list_active_users(db: &Database) -> Result<Vec<User>, WaggleError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE is_active = 1 AND opted_out = 0 ORDER BY user_id"
            ))?;
            let rows = stmt.query_map([], row_to_user)?;
            let mut users = Vec::new();
            for row in rows {
                users.push(row?);
            }
            Ok(users)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn ensure_user_creates_on_first_contact() {
        let (db, _dir) = setup_db().await;
        let uid = UserId("U1".into());

        let user = ensure_user(&db, &uid, Some("Dana")).await.unwrap();
        assert_eq!(user.user_id, uid);
        assert_eq!(user.display_name.as_deref(), Some("Dana"));
        assert!(user.is_active);
        assert!(!user.opted_out);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn ensure_user_refreshes_display_name() {
        let (db, _dir) = setup_db().await;
        let uid = UserId("U1".into());

        ensure_user(&db, &uid, Some("Dana")).await.unwrap();
        let user = ensure_user(&db, &uid, Some("Dana R.")).await.unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Dana R."));

        // A contact without a name keeps the stored one.
        let user = ensure_user(&db, &uid, None).await.unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Dana R."));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_nonexistent_user_returns_none() {
        let (db, _dir) = setup_db().await;
        let result = get_user(&db, &UserId("nobody".into())).await.unwrap();
        assert!(result.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn opt_out_and_back_in() {
        let (db, _dir) = setup_db().await;
        let uid = UserId("U1".into());
        ensure_user(&db, &uid, None).await.unwrap();

        set_opted_out(&db, &uid, true).await.unwrap();
        assert!(get_user(&db, &uid).await.unwrap().unwrap().opted_out);

        set_opted_out(&db, &uid, false).await.unwrap();
        assert!(!get_user(&db, &uid).await.unwrap().unwrap().opted_out);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn active_listing_excludes_opted_out() {
        let (db, _dir) = setup_db().await;
        ensure_user(&db, &UserId("U1".into()), None).await.unwrap();
        ensure_user(&db, &UserId("U2".into()), None).await.unwrap();
        set_opted_out(&db, &UserId("U2".into()), true).await.unwrap();

        let all = list_users(&db).await.unwrap();
        assert_eq!(all.len(), 2);

        let active = list_active_users(&db).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].user_id, UserId("U1".into()));

        db.close().await.unwrap();
    }
}
