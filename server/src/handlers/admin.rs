// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Staff-only views. Everything is read only except the presentation fields
//! of quadrants.
use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use common::{AdminSessionQuery, AdminTaskQuery, QuadrantEditForm, SessionStatus, SessionType, TaskStatus};
use tracing::info;

use crate::auth::StaffUser;
use crate::database::sessions::{self, SessionFilter};
use crate::database::tasks::{self, QuadrantFilter, TaskFilter};
use crate::database::{quadrants, users};
use crate::error::AppError;
use crate::forms;
use crate::pages;
use crate::state::AppState;

/// Non-empty, trimmed query value.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `none` selects unsorted tasks, a number selects a quadrant, anything else is ignored.
fn quadrant_filter(raw: Option<&str>) -> Option<QuadrantFilter> {
    match present(raw)? {
        "none" => Some(QuadrantFilter::Unassigned),
        value => value.parse().ok().map(QuadrantFilter::Id),
    }
}

pub async fn index(StaffUser(user): StaffUser) -> Html<String> {
    Html(pages::admin::index(&user))
}

pub async fn tasks(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Query(query): Query<AdminTaskQuery>,
) -> Result<Html<String>, AppError> {
    let filter = TaskFilter {
        search: present(query.q.as_deref()).map(str::to_string),
        quadrant: quadrant_filter(query.quadrant.as_deref()),
        status: present(query.status.as_deref()).and_then(|s| s.parse::<TaskStatus>().ok()),
    };
    let listings = tasks::search_tasks(&state.pool, &filter).await?;
    let quadrants = quadrants::list_quadrants(&state.pool).await?;
    Ok(Html(pages::admin::tasks(&user, &listings, &query, &quadrants)))
}

pub async fn task_detail(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Path(task_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let listing = tasks::get_task_by_id(&state.pool, task_id)
        .await?
        .ok_or_else(|| AppError::PageNotFound("Task not found".to_string()))?;
    Ok(Html(pages::admin::task_detail(&user, &listing)))
}

pub async fn sessions(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Query(query): Query<AdminSessionQuery>,
) -> Result<Html<String>, AppError> {
    let filter = SessionFilter {
        search: present(query.q.as_deref()).map(str::to_string),
        session_type: present(query.session_type.as_deref()).and_then(|t| t.parse::<SessionType>().ok()),
        status: present(query.status.as_deref()).and_then(|s| s.parse::<SessionStatus>().ok()),
    };
    let listings = sessions::search_sessions(&state.pool, &filter).await?;
    Ok(Html(pages::admin::sessions(&user, &listings, &query)))
}

pub async fn quadrants(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
) -> Result<Html<String>, AppError> {
    let quadrants = quadrants::list_quadrants(&state.pool).await?;
    Ok(Html(pages::admin::quadrants(&user, &quadrants, None)))
}

/// Changes the order and color of a quadrant. Nothing else about it is editable.
pub async fn update_quadrant(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Path(quadrant_id): Path<i64>,
    Form(form): Form<QuadrantEditForm>,
) -> Result<Response, AppError> {
    if quadrants::get_quadrant(&state.pool, quadrant_id).await?.is_none() {
        return Err(AppError::PageNotFound("Quadrant not found".to_string()));
    }

    match forms::validate_quadrant_edit(&form) {
        Ok((priority_order, color_code)) => {
            quadrants::update_quadrant_display(&state.pool, quadrant_id, priority_order, &color_code).await?;
            info!("{} edited quadrant {}", user.username, quadrant_id);
            Ok(Redirect::to("/admin/quadrants/").into_response())
        }
        Err(errors) => {
            let quadrants = quadrants::list_quadrants(&state.pool).await?;
            Ok((
                StatusCode::BAD_REQUEST,
                Html(pages::admin::quadrants(&user, &quadrants, Some((quadrant_id, &errors)))),
            )
                .into_response())
        }
    }
}

pub async fn users(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
) -> Result<Html<String>, AppError> {
    let accounts = users::list_users_with_settings(&state.pool).await?;
    Ok(Html(pages::admin::users(&user, &accounts)))
}

pub async fn user_detail(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Path(user_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let account = users::get_user_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::PageNotFound("User not found".to_string()))?;
    let settings = users::get_settings(&state.pool, account.id).await?;
    Ok(Html(pages::admin::user_detail(&user, &account, settings.as_ref())))
}
