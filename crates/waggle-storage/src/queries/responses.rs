// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weekly response CRUD operations.
//!
//! Responses are keyed by (user_id, week_start_date) with a UNIQUE
//! constraint; writes go through `ON CONFLICT DO UPDATE` so repeating a
//! terminal transition within the same week replaces the earlier row.

use rusqlite::types::Value;
use rusqlite::params;
use waggle_core::types::{ResponseFilter, UserId, WeekStart, WeeklyResponse};
use waggle_core::WaggleError;

use crate::database::Database;

const RESPONSE_COLUMNS: &str = "user_id, week_start_date, participated, categories, tools, \
                                custom_tools, custom_details, created_at, updated_at";

fn encode_list(items: &[String]) -> Result<String, rusqlite::Error> {
    serde_json::to_string(items).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn decode_list(idx: usize, raw: String) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_response(row: &rusqlite::Row<'_>) -> rusqlite::Result<WeeklyResponse> {
    let week: String = row.get(1)?;
    let week_start = week.parse::<WeekStart>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(WeeklyResponse {
        user_id: UserId(row.get(0)?),
        week_start,
        participated: row.get::<_, i64>(2)? != 0,
        categories: decode_list(3, row.get(3)?)?,
        tools: decode_list(4, row.get(4)?)?,
        custom_tools: decode_list(5, row.get(5)?)?,
        custom_details: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Insert or replace the response for (user, week).
pub async fn upsert_weekly_response(
    db: &Database,
    response: &WeeklyResponse,
) -> Result<(), WaggleError> {
    let response = response.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO weekly_responses
                     (user_id, week_start_date, participated, categories, tools,
                      custom_tools, custom_details)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(user_id, week_start_date) DO UPDATE SET
                     participated = excluded.participated,
                     categories = excluded.categories,
                     tools = excluded.tools,
                     custom_tools = excluded.custom_tools,
                     custom_details = excluded.custom_details,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    response.user_id.0,
                    response.week_start.to_string(),
                    response.participated as i64,
                    encode_list(&response.categories)?,
                    encode_list(&response.tools)?,
                    encode_list(&response.custom_tools)?,
                    response.custom_details,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Query responses matching the filter, newest first.
///
/// Category and tool containment filters use `json_each` over the JSON
/// array columns (json1 ships with the bundled SQLite).
pub async fn find_responses(
    db: &Database,
    filter: &ResponseFilter,
) -> Result<Vec<WeeklyResponse>, WaggleError> {
    let filter = filter.clone();
    db.connection()
        .call(move |conn| {
            let mut sql = format!("SELECT {RESPONSE_COLUMNS} FROM weekly_responses");
            let mut clauses: Vec<&str> = Vec::new();
            let mut bind: Vec<Value> = Vec::new();

            if let Some(week) = filter.week_start {
                clauses.push("week_start_date = ?");
                bind.push(Value::Text(week.to_string()));
            }
            if let Some(ref user) = filter.user_id {
                clauses.push("user_id = ?");
                bind.push(Value::Text(user.0.clone()));
            }
            if let Some(participated) = filter.participated {
                clauses.push("participated = ?");
                bind.push(Value::Integer(participated as i64));
            }
            if let Some(ref category) = filter.category {
                clauses.push(
                    "EXISTS (SELECT 1 FROM json_each(categories) WHERE json_each.value = ?)",
                );
                bind.push(Value::Text(category.clone()));
            }
            if let Some(ref tool) = filter.tool {
                clauses
                    .push("EXISTS (SELECT 1 FROM json_each(tools) WHERE json_each.value = ?)");
                bind.push(Value::Text(tool.clone()));
            }

            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
            sql.push_str(" ORDER BY updated_at DESC, id DESC");
            if let Some(limit) = filter.limit {
                sql.push_str(" LIMIT ?");
                bind.push(Value::Integer(limit));
            }

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(bind), row_to_response)?;
            let mut responses = Vec::new();
            for row in rows {
                responses.push(row?);
            }
            Ok(responses)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Whether the user already has a response recorded for the week.
pub async fn has_response(
    db: &Database,
    user_id: &UserId,
    week: WeekStart,
) -> Result<bool, WaggleError> {
    let id = user_id.0.clone();
    let week = week.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT 1 FROM weekly_responses
                 WHERE user_id = ?1 AND week_start_date = ?2",
                params![id, week],
                |_| Ok(()),
            );
            match result {
                Ok(()) => Ok(true),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
