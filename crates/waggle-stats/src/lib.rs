// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregated participation statistics.
//!
//! Everything here is computed from the response repository and the
//! user directory; nothing is cached. Volumes are community-sized
//! (hundreds of users), so full scans per request are fine.

use std::collections::HashMap;

use serde::Serialize;
use waggle_core::{
    ResponseFilter, ResponseRepository, UserDirectory, WaggleError, WeekStart, WeeklyResponse,
};

/// One (name, count) aggregation row, ordered by count descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow {
    pub name: String,
    pub count: usize,
}

/// Participation numbers for one week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekRow {
    pub week_start: String,
    pub responses: usize,
    pub participated: usize,
    pub participation_rate: f64,
}

/// A summary for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_users: usize,
    pub active_users: usize,
    pub responses_this_week: usize,
    pub participated_this_week: usize,
    /// Share of this week's responses that said yes, 0.0 when there
    /// are no responses yet.
    pub participation_rate: f64,
    pub top_categories: Vec<CountRow>,
    pub top_tools: Vec<CountRow>,
    pub recent_responses: Vec<WeeklyResponse>,
}

const TOP_N: usize = 5;
const RECENT_N: i64 = 10;

fn count_values<'a>(
    responses: impl Iterator<Item = &'a WeeklyResponse>,
    pick: impl Fn(&WeeklyResponse) -> &[String],
) -> Vec<CountRow> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for response in responses {
        for value in pick(response) {
            *counts.entry(value.as_str()).or_default() += 1;
        }
    }
    let mut rows: Vec<CountRow> = counts
        .into_iter()
        .map(|(name, count)| CountRow {
            name: name.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    rows
}

fn rate(participated: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        participated as f64 / total as f64
    }
}

/// Category usage across all stored responses, most used first.
pub async fn category_counts(
    repository: &dyn ResponseRepository,
) -> Result<Vec<CountRow>, WaggleError> {
    let responses = repository.find_responses(&ResponseFilter::default()).await?;
    Ok(count_values(responses.iter(), |r| &r.categories))
}

/// Tool usage across all stored responses, most used first.
pub async fn tool_counts(
    repository: &dyn ResponseRepository,
) -> Result<Vec<CountRow>, WaggleError> {
    let responses = repository.find_responses(&ResponseFilter::default()).await?;
    Ok(count_values(responses.iter(), |r| &r.tools))
}

/// Weekly participation for the `weeks` most recent weeks, oldest first.
/// Weeks with no responses are included with zero counts.
pub async fn participation_by_week(
    repository: &dyn ResponseRepository,
    weeks: u32,
) -> Result<Vec<WeekRow>, WaggleError> {
    let current = WeekStart::current();
    let mut rows = Vec::with_capacity(weeks as usize);
    for offset in (0..weeks).rev() {
        let week = current.minus_weeks(offset);
        let responses = repository
            .find_responses(&ResponseFilter {
                week_start: Some(week),
                ..Default::default()
            })
            .await?;
        let participated = responses.iter().filter(|r| r.participated).count();
        rows.push(WeekRow {
            week_start: week.to_string(),
            responses: responses.len(),
            participated,
            participation_rate: rate(participated, responses.len()),
        });
    }
    Ok(rows)
}

/// The full dashboard summary for the current week.
pub async fn dashboard_stats(
    repository: &dyn ResponseRepository,
    directory: &dyn UserDirectory,
) -> Result<DashboardStats, WaggleError> {
    let total_users = directory.list_users().await?.len();
    let active_users = directory.list_active_users().await?.len();

    let week = WeekStart::current();
    let this_week = repository
        .find_responses(&ResponseFilter {
            week_start: Some(week),
            ..Default::default()
        })
        .await?;
    let participated_this_week = this_week.iter().filter(|r| r.participated).count();

    let all = repository.find_responses(&ResponseFilter::default()).await?;
    let mut top_categories = count_values(all.iter(), |r| &r.categories);
    top_categories.truncate(TOP_N);
    let mut top_tools = count_values(all.iter(), |r| &r.tools);
    top_tools.truncate(TOP_N);

    let recent_responses = repository
        .find_responses(&ResponseFilter {
            limit: Some(RECENT_N),
            ..Default::default()
        })
        .await?;

    Ok(DashboardStats {
        total_users,
        active_users,
        responses_this_week: this_week.len(),
        participated_this_week,
        participation_rate: rate(participated_this_week, this_week.len()),
        top_categories,
        top_tools,
        recent_responses,
    })
}
