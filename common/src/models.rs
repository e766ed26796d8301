// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::completion_percentage;

/// Default Pomodoro timings applied to every new account.
pub const DEFAULT_POMODORO_MINUTES: i64 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: i64 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: i64 = 15;
pub const DEFAULT_POMODOROS_BEFORE_LONG_BREAK: i64 = 4;

/// A registered account.
///
/// The password hash never leaves the server: it is skipped by serde and
/// only read by the authentication code.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// "First Last", falling back to the username when both are blank.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Per-user Pomodoro timer settings, durations in minutes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserSettings {
    pub id: i64,
    pub user_id: i64,
    pub pomodoro_duration: i64,
    pub short_break_duration: i64,
    pub long_break_duration: i64,
    pub pomodoros_before_long_break: i64,
}

/// One of the four fixed Eisenhower matrix categories.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Quadrant {
    pub id: i64,
    pub name: String,
    pub description: String,
    // 1 = urgent and important ... 4 = neither
    pub priority_order: i64,
    pub color_code: String,
    pub icon: String,
}

#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    sqlx::Type,
    EnumString,
    Display,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Active,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// A task owned by one user, optionally placed in a quadrant.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    // None while the task sits in the "unassigned" list.
    pub quadrant_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    // Position inside (user, quadrant). Not unique, gaps are allowed.
    pub display_order: i64,
    pub priority: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_pomodoros: i64,
    pub completed_pomodoros: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn progress(&self) -> TaskProgress {
        TaskProgress::new(self.completed_pomodoros, self.estimated_pomodoros)
    }
}

/// Pomodoro progress of a task as reported to the timer page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskProgress {
    pub completed: i64,
    pub total: i64,
    pub percentage: f64,
}

impl TaskProgress {
    pub fn new(completed: i64, total: i64) -> Self {
        Self {
            completed,
            total,
            percentage: completion_percentage(completed, total),
        }
    }
}

#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    sqlx::Type,
    EnumString,
    Display,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::ShortBreak => "Short break",
            Self::LongBreak => "Long break",
        }
    }
}

#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    sqlx::Type,
    EnumString,
    Display,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    Completed,
    Interrupted,
    Cancelled,
}

impl SessionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Interrupted => "Interrupted",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// A single timer run against a task.
///
/// `end_time` stays `None` while the timer is running. The status column
/// defaults to `completed` on insert and is overwritten when the session ends.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct PomodoroSession {
    pub id: i64,
    pub user_id: i64,
    pub task_id: i64,
    pub session_type: SessionType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
}

impl PomodoroSession {
    pub fn is_running(&self) -> bool {
        self.end_time.is_none()
    }

    /// Length of a finished session in whole seconds.
    pub fn duration_secs(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_seconds().max(0))
    }
}

/// A session joined with the names needed for listings.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct SessionListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub session: PomodoroSession,
    pub task_title: String,
    pub username: String,
}

/// Daily productivity aggregate, at most one row per (user, date).
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct ProductivityStats {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub total_pomodoros_completed: i64,
    pub total_tasks_completed: i64,
    // Seconds spent per quadrant, keyed by priority order ("1".."4").
    pub time_spent_per_quadrant: Json<BTreeMap<String, i64>>,
    pub quadrant_2_time: i64,
    pub planned_pomodoros: i64,
    pub completed_on_time_tasks: i64,
    pub focus_score: f64,
    pub productivity_score: f64,
    pub interruptions_count: i64,
}
