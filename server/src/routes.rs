// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers::{self, admin, analytics, pomodoro, site, tasks, users};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Creates and configures the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Informational pages
        .route("/", get(site::home))
        .route("/about/", get(site::about))
        .route("/eisenhower-method/", get(site::eisenhower_method))
        .route("/pomodoro-technique/", get(site::pomodoro_technique))
        // Accounts
        .route("/users/register/", get(users::register_page).post(users::register))
        .route("/users/login/", get(users::login_page).post(users::login))
        .route("/users/logout/", get(users::logout).post(users::logout))
        .route("/users/profile/", get(users::profile_page).post(users::update_profile))
        .route(
            "/users/password-reset/",
            get(users::password_reset_page).post(users::password_reset_request),
        )
        .route("/users/password-reset/done/", get(users::password_reset_done))
        .route(
            "/users/reset/{token}/",
            get(users::password_reset_confirm_page).post(users::password_reset_confirm),
        )
        .route("/users/reset/done/", get(users::password_reset_complete))
        // Eisenhower matrix
        .route("/tasks/matrix/", get(tasks::matrix_view).post(tasks::create_task))
        .route("/tasks/task/{id}/update/", post(tasks::update_task))
        .route("/tasks/task/{id}/delete/", post(tasks::delete_task))
        .route("/tasks/tasks/reorder/", post(tasks::reorder_tasks))
        // Pomodoro timer
        .route("/pomodoro/task/{id}/", get(pomodoro::task_detail))
        .route("/pomodoro/task/{id}/complete/", post(pomodoro::complete_task))
        .route("/pomodoro/task/{id}/progress/", post(pomodoro::update_task_progress))
        .route("/pomodoro/api/start_session/", post(pomodoro::start_session))
        .route("/pomodoro/api/end_session/", post(pomodoro::end_session))
        .route("/pomodoro/sessions/", get(pomodoro::session_history))
        // Analytics
        .route(
            "/analytics/api/stats/",
            get(analytics::list_stats).post(analytics::record_stats),
        )
        .route(
            "/analytics/api/stats/{date}/",
            get(analytics::day_stats).post(analytics::create_day_stats),
        )
        // Administration
        .route("/admin/", get(admin::index))
        .route("/admin/tasks/", get(admin::tasks))
        .route("/admin/tasks/{id}/", get(admin::task_detail))
        .route("/admin/sessions/", get(admin::sessions))
        .route("/admin/quadrants/", get(admin::quadrants))
        .route("/admin/quadrants/{id}/", post(admin::update_quadrant))
        .route("/admin/users/", get(admin::users))
        .route("/admin/users/{id}/", get(admin::user_detail))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        // Adds the shared state (pool, login sessions, settings)
        .with_state(state)
}
