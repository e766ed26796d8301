// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{
        Form, Json, Path, State,
        rejection::{FormRejection, JsonRejection},
    },
    response::Html,
};
use chrono::Utc;
use common::{
    EndSessionPayload, ProgressForm, SessionStatus, SessionType, StartSessionPayload,
    completion_percentage,
};
use serde_json::{Value, json};
use tracing::info;

use crate::auth::CurrentUser;
use crate::database::sessions::{self, SessionEnd};
use crate::database::{tasks, users};
use crate::error::AppError;
use crate::forms;
use crate::handlers::{form_body, json_body};
use crate::pages;
use crate::pages::pomodoro::TaskDetail;
use crate::state::AppState;

/// Timer page of one task.
pub async fn task_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let task = tasks::get_task_for_user(&state.pool, task_id, user.id)
        .await?
        .ok_or_else(|| AppError::PageNotFound("Task not found".to_string()))?;
    let settings = users::get_or_create_settings(&state.pool, user.id).await?;
    let today = Utc::now().date_naive();
    let today_sessions = sessions::count_sessions_on(&state.pool, user.id, task.id, today).await?;
    let recent = sessions::recent_sessions_for_task(&state.pool, user.id, task.id, sessions::RECENT_LIMIT).await?;

    let detail = TaskDetail {
        task: &task,
        settings: &settings,
        today_sessions,
        recent_sessions: &recent,
        progress: task.progress(),
    };
    Ok(Html(pages::pomodoro::task_detail(&user, &detail)))
}

pub async fn start_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<StartSessionPayload>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let payload = json_body(payload)?;
    let session_type = match payload.session_type.as_deref() {
        None => SessionType::Work,
        Some(raw) => raw.parse::<SessionType>().map_err(|e: strum::ParseError| {
            AppError::BadRequest(format!("Unknown session type '{}': {}", raw, e))
        })?,
    };

    let session = sessions::start_session_in_db(&state.pool, user.id, payload.task_id, session_type)
        .await?
        .ok_or_else(|| AppError::not_found("Task"))?;

    Ok(Json(json!({
        "success": true,
        "session_id": session.id,
        "message": "Session started",
    })))
}

/// Ends a session; a completed work session adds one pomodoro to its task.
pub async fn end_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<EndSessionPayload>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let payload = json_body(payload)?;
    let status = match payload.status.as_deref() {
        None => SessionStatus::Completed,
        Some(raw) => raw.parse::<SessionStatus>().map_err(|e: strum::ParseError| {
            AppError::BadRequest(format!("Unknown session status '{}': {}", raw, e))
        })?,
    };

    match sessions::end_session_in_db(&state.pool, payload.session_id, user.id, status).await? {
        SessionEnd::Ended { progress, .. } => Ok(Json(json!({
            "success": true,
            "message": "Session ended",
            "task_progress": progress,
        }))),
        SessionEnd::NotFound => Err(AppError::not_found("Session")),
        SessionEnd::AlreadyEnded => Err(AppError::Conflict("Session already ended".to_string())),
    }
}

pub async fn session_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, AppError> {
    let history = sessions::session_history(&state.pool, user.id, sessions::HISTORY_LIMIT).await?;
    Ok(Html(pages::pomodoro::history(&user, &history)))
}

pub async fn complete_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let task = tasks::complete_task_in_db(&state.pool, task_id, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Task"))?;

    info!("Task {} completed by {}", task.id, user.username);
    Ok(Json(json!({
        "success": true,
        "message": "Task completed",
        "redirect_url": "/tasks/matrix/",
    })))
}

/// Sets the completed-pomodoro counter explicitly. A blank value only reports progress.
pub async fn update_task_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<i64>,
    form: Result<Form<ProgressForm>, FormRejection>,
) -> Result<Json<Value>, AppError> {
    let form = form_body(form)?;
    let completed = forms::parse_completed_pomodoros(form.completed_pomodoros.as_deref())
        .map_err(AppError::BadRequest)?;

    let task = match completed {
        Some(count) => tasks::set_completed_pomodoros(&state.pool, task_id, user.id, count).await?,
        None => tasks::get_task_for_user(&state.pool, task_id, user.id).await?,
    }
    .ok_or_else(|| AppError::not_found("Task"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Progress updated",
        "progress": {
            "completed": task.completed_pomodoros,
            "estimated": task.estimated_pomodoros,
            "percentage": completion_percentage(task.completed_pomodoros, task.estimated_pomodoros),
        }
    })))
}
