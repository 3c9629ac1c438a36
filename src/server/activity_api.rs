//! Activity API: read-only screen-observation aggregates.

use axum::{
    extract::{Query, State},
    response::Response,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::{api_response, AppState};

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    /// Day to summarize (YYYY-MM-DD); defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyQuery {
    /// First day of the 7-day window; defaults to today minus 6 days.
    pub week_start: Option<NaiveDate>,
}

/// Daily activity summary.
pub async fn daily(State(state): State<AppState>, Query(query): Query<DailyQuery>) -> Response {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    api_response(state.screen.daily_summary(date).await)
}

/// Weekly activity summary.
pub async fn weekly(State(state): State<AppState>, Query(query): Query<WeeklyQuery>) -> Response {
    let week_start = query
        .week_start
        .unwrap_or_else(|| Utc::now().date_naive() - chrono::Duration::days(6));
    api_response(state.screen.weekly_summary(week_start).await)
}
