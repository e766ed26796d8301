// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{
    Json, Path, Query, State,
    rejection::{JsonRejection, PathRejection},
};
use chrono::{NaiveDate, Utc};
use common::{StatsPayload, StatsQuery};
use serde_json::{Value, json};
use tracing::debug;

use crate::auth::CurrentUser;
use crate::database::stats;
use crate::error::AppError;
use crate::forms;
use crate::handlers::json_body;
use crate::state::AppState;

/// The user's daily rows between `from` and `to` (both optional, inclusive).
pub async fn list_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Value>, AppError> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(AppError::BadRequest("'from' must not be after 'to'".to_string()));
        }
    }
    let rows = stats::list_stats_for_user(&state.pool, user.id, query.from, query.to).await?;
    debug!("Returning {} stats rows for user {}", rows.len(), user.id);
    Ok(Json(json!({ "success": true, "stats": rows })))
}

/// Writes the row of one day (today by default), replacing any earlier values.
pub async fn record_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<StatsPayload>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let payload = json_body(payload)?;
    let daily = forms::validate_stats(&payload).map_err(AppError::Validation)?;
    let date = payload.date.unwrap_or_else(|| Utc::now().date_naive());

    let row = stats::upsert_stats_in_db(&state.pool, user.id, date, &daily).await?;
    Ok(Json(json!({ "success": true, "stats": row })))
}

fn day_from_path(path: Result<Path<NaiveDate>, PathRejection>) -> Result<NaiveDate, AppError> {
    path.map(|Path(date)| date)
        .map_err(|rejection| AppError::BadRequest(format!("Invalid date: {}", rejection.body_text())))
}

/// The user's row for one day.
pub async fn day_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    date: Result<Path<NaiveDate>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let date = day_from_path(date)?;
    let row = stats::get_stats_for_day(&state.pool, user.id, date)
        .await?
        .ok_or_else(|| AppError::not_found("Stats"))?;
    Ok(Json(json!({ "success": true, "stats": row })))
}

/// Creates the row of the day in the path. An existing row is left alone and
/// reported as a conflict.
pub async fn create_day_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    date: Result<Path<NaiveDate>, PathRejection>,
    payload: Result<Json<StatsPayload>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let date = day_from_path(date)?;
    let payload = json_body(payload)?;
    if payload.date.is_some_and(|body_date| body_date != date) {
        return Err(AppError::BadRequest(
            "Body date does not match the date in the path".to_string(),
        ));
    }
    let daily = forms::validate_stats(&payload).map_err(AppError::Validation)?;

    let row = stats::insert_stats_in_db(&state.pool, user.id, date, &daily)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Stats for {} already exist", date)))?;
    Ok(Json(json!({ "success": true, "stats": row })))
}
