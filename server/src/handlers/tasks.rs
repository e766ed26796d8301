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
use common::{CreateTaskForm, ReorderPayload, UNASSIGNED_QUADRANT, UpdateTaskForm};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::auth::CurrentUser;
use crate::database::{quadrants, tasks};
use crate::error::AppError;
use crate::forms;
use crate::handlers::{form_body, json_body};
use crate::pages;
use crate::state::AppState;

/// Handler for the matrix page.
pub async fn matrix_view(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, AppError> {
    let quadrants = quadrants::list_quadrants(&state.pool).await?;
    let unassigned = tasks::list_unassigned_tasks(&state.pool, user.id).await?;
    let assigned = tasks::list_assigned_tasks(&state.pool, user.id).await?;
    debug!(
        "Matrix of {}: {} unsorted, {} sorted tasks",
        user.username,
        unassigned.len(),
        assigned.len()
    );
    Ok(Html(pages::tasks::matrix(&user, &quadrants, &unassigned, &assigned)))
}

/// Handler for creating a task from the matrix page. New tasks start unsorted.
pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    form: Result<Form<CreateTaskForm>, FormRejection>,
) -> Result<Json<Value>, AppError> {
    let form = form_body(form)?;
    let input = forms::validate_new_task(&form).map_err(AppError::Validation)?;

    let task = tasks::create_task_in_db(
        &state.pool,
        tasks::NewTask {
            user_id: user.id,
            quadrant_id: None,
            title: input.title,
            description: input.description,
        },
    )
    .await?;

    info!("Task created successfully with ID: {}", task.id);
    Ok(Json(json!({
        "success": true,
        "task_id": task.id,
        "message": "Task created",
        "task_title": task.title,
        "task_description": task.description,
    })))
}

pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<i64>,
    form: Result<Form<UpdateTaskForm>, FormRejection>,
) -> Result<Json<Value>, AppError> {
    let form = form_body(form)?;
    let update = forms::validate_task_update(&form).map_err(AppError::Validation)?;

    let task = tasks::update_task_in_db(&state.pool, task_id, user.id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("Task"))?;

    info!("Task {} updated", task.id);
    Ok(Json(json!({
        "success": true,
        "message": "Task updated",
        "task": {
            "id": task.id,
            "title": task.title,
            "description": task.description,
            "estimated_pomodoros": task.estimated_pomodoros,
        }
    })))
}

/// Deletes a task; its sessions go with it.
pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    if tasks::delete_task_in_db(&state.pool, task_id, user.id).await? {
        Ok(Json(json!({ "success": true, "message": "Task deleted" })))
    } else {
        warn!("Task with ID {} not found for deletion.", task_id);
        Err(AppError::not_found("Task"))
    }
}

/// Moves a task after a drag and drop.
///
/// Quadrant `0` sends the task back to the unsorted list with order 0.
/// The other tasks of the target keep their order values.
pub async fn reorder_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ReorderPayload>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let payload = json_body(payload)?;
    debug!("Reorder request: {:?}", payload);

    if tasks::get_task_for_user(&state.pool, payload.task_id, user.id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found("Task"));
    }

    let (quadrant_id, display_order) = if payload.new_quadrant_id == UNASSIGNED_QUADRANT {
        (None, 0)
    } else {
        if quadrants::get_quadrant(&state.pool, payload.new_quadrant_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found("Quadrant"));
        }
        if payload.new_order < 0 {
            return Err(AppError::BadRequest(
                "new_order must not be negative".to_string(),
            ));
        }
        (Some(payload.new_quadrant_id), payload.new_order)
    };

    if !tasks::move_task_in_db(&state.pool, payload.task_id, user.id, quadrant_id, display_order).await? {
        return Err(AppError::not_found("Task"));
    }

    info!(
        "Task {} moved to quadrant {:?} at {}",
        payload.task_id, quadrant_id, display_order
    );
    Ok(Json(json!({ "success": true, "message": "Task moved" })))
}
