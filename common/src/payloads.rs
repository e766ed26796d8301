// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Request bodies accepted by the server.
//!
//! Browser forms arrive url-encoded, so numeric form fields are kept as
//! strings here and parsed (with field-level errors) by the server's
//! validation code. Empty inputs then stay distinguishable from bad ones.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// `new_quadrant_id` value that sends a task back to the unassigned list.
pub const UNASSIGNED_QUADRANT: i64 = 0;

/// Task creation from the matrix page. Everything else is defaulted.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct CreateTaskForm {
    pub title: String,
    pub description: String,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct UpdateTaskForm {
    pub title: String,
    pub description: String,
    pub estimated_pomodoros: Option<String>,
    pub priority: Option<String>,
    // `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM` from a date/datetime-local input.
    pub due_date: Option<String>,
}

/// Drag-and-drop move of a task.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ReorderPayload {
    pub task_id: i64,
    pub new_quadrant_id: i64,
    #[serde(default)]
    pub new_order: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StartSessionPayload {
    pub task_id: i64,
    #[serde(default)]
    pub session_type: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct EndSessionPayload {
    pub session_id: i64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ProgressForm {
    pub completed_pomodoros: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct LoginQuery {
    pub next: Option<String>,
    pub registered: Option<String>,
}

/// Both profile forms post to the same URL; `form_type` tells them apart.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ProfileForm {
    pub form_type: Option<String>,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub pomodoro_duration: String,
    pub short_break_duration: String,
    pub long_break_duration: String,
    pub pomodoros_before_long_break: String,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct ProfileQuery {
    pub updated: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct PasswordResetRequestForm {
    pub email: String,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct SetPasswordForm {
    pub new_password1: String,
    pub new_password2: String,
}

/// Daily statistics written by the application. Missing counters are zero.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct StatsPayload {
    pub date: Option<NaiveDate>,
    pub total_pomodoros_completed: i64,
    pub total_tasks_completed: i64,
    pub time_spent_per_quadrant: BTreeMap<String, i64>,
    pub quadrant_2_time: i64,
    pub planned_pomodoros: i64,
    pub completed_on_time_tasks: i64,
    pub focus_score: f64,
    pub productivity_score: f64,
    pub interruptions_count: i64,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct StatsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Search and filters of the administrative task list.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct AdminTaskQuery {
    pub q: Option<String>,
    pub quadrant: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct AdminSessionQuery {
    pub q: Option<String>,
    pub session_type: Option<String>,
    pub status: Option<String>,
}

/// The only quadrant fields staff may change.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct QuadrantEditForm {
    pub priority_order: String,
    pub color_code: String,
}
