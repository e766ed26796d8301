// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Validation of submitted forms.
//!
//! Each validator returns either the cleaned values or a map of field
//! errors. Checks that need the database (uniqueness) are done by the
//! handlers, which add to the same map.
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use common::{
    CreateTaskForm, LoginForm, ProfileForm, QuadrantEditForm, RegisterForm, SetPasswordForm,
    StatsPayload, UpdateTaskForm,
};
use lazy_static::lazy_static;
use regex::Regex;

use crate::database::stats::DailyStats;
use crate::database::tasks::TaskUpdate;
use crate::database::users::{ProfileUpdate, SettingsUpdate};
use crate::error::{FieldErrors, NON_FIELD_ERRORS};

pub const TITLE_MAX_CHARS: usize = 200;
pub const USERNAME_MAX_CHARS: usize = 150;
pub const NAME_MAX_CHARS: usize = 30;
pub const PASSWORD_MIN_CHARS: usize = 8;

pub const REQUIRED: &str = "This field is required.";
pub const EMAIL_TAKEN: &str = "A user with that email already exists.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[\w.@+-]+$").expect("valid username pattern");
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern");
    static ref COLOR_RE: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color pattern");
}

pub fn add_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

fn finish<T>(errors: FieldErrors, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
    if errors.is_empty() { Ok(value()) } else { Err(errors) }
}

fn required_text(errors: &mut FieldErrors, field: &str, raw: &str, max_chars: usize) -> String {
    let value = raw.trim();
    if value.is_empty() {
        add_error(errors, field, REQUIRED);
    } else if value.chars().count() > max_chars {
        add_error(
            errors,
            field,
            format!("Ensure this value has at most {} characters.", max_chars),
        );
    }
    value.to_string()
}

fn optional_text(errors: &mut FieldErrors, field: &str, raw: &str, max_chars: usize) -> String {
    let value = raw.trim();
    if value.chars().count() > max_chars {
        add_error(
            errors,
            field,
            format!("Ensure this value has at most {} characters.", max_chars),
        );
    }
    value.to_string()
}

/// Parses an integer field within `min..=max`. Errors are recorded, not returned.
fn int_in_range(errors: &mut FieldErrors, field: &str, raw: &str, min: i64, max: i64) -> i64 {
    match raw.trim().parse::<i64>() {
        Ok(value) if (min..=max).contains(&value) => value,
        Ok(_) => {
            add_error(
                errors,
                field,
                format!("Enter a whole number between {} and {}.", min, max),
            );
            min
        }
        Err(_) if raw.trim().is_empty() => {
            add_error(errors, field, REQUIRED);
            min
        }
        Err(_) => {
            add_error(errors, field, "Enter a whole number.");
            min
        }
    }
}

/// Like [`int_in_range`], but a blank input means "keep the current value".
fn optional_int_in_range(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<&str>,
    min: i64,
    max: i64,
) -> Option<i64> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => Some(int_in_range(errors, field, value, min, max)),
        None => None,
    }
}

fn email(errors: &mut FieldErrors, raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        add_error(errors, "email", REQUIRED);
    } else if !EMAIL_RE.is_match(value) {
        add_error(errors, "email", "Enter a valid email address.");
    }
    value.to_string()
}

fn username(errors: &mut FieldErrors, raw: &str) -> String {
    let value = required_text(errors, "username", raw, USERNAME_MAX_CHARS);
    if !value.is_empty() && !USERNAME_RE.is_match(&value) {
        add_error(
            errors,
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
    value
}

/// Checks a new password pair; errors land on `field` (the confirmation field).
fn new_password(errors: &mut FieldErrors, field: &str, first: &str, second: &str) -> String {
    if first.is_empty() {
        add_error(errors, field, REQUIRED);
        return String::new();
    }
    if first != second {
        add_error(errors, field, "The two password fields didn't match.");
        return String::new();
    }
    if first.chars().count() < PASSWORD_MIN_CHARS {
        add_error(
            errors,
            field,
            format!(
                "This password is too short. It must contain at least {} characters.",
                PASSWORD_MIN_CHARS
            ),
        );
    }
    if first.chars().all(|c| c.is_ascii_digit()) {
        add_error(errors, field, "This password is entirely numeric.");
    }
    first.to_string()
}

/// Parses `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC) or RFC 3339.
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTaskInput {
    pub title: String,
    pub description: String,
}

pub fn validate_new_task(form: &CreateTaskForm) -> Result<NewTaskInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    let title = required_text(&mut errors, "title", &form.title, TITLE_MAX_CHARS);
    let description = form.description.trim().to_string();
    finish(errors, || NewTaskInput { title, description })
}

pub fn validate_task_update(form: &UpdateTaskForm) -> Result<TaskUpdate, FieldErrors> {
    let mut errors = FieldErrors::new();
    let title = required_text(&mut errors, "title", &form.title, TITLE_MAX_CHARS);
    let estimated_pomodoros = optional_int_in_range(
        &mut errors,
        "estimated_pomodoros",
        form.estimated_pomodoros.as_deref(),
        1,
        i64::from(i32::MAX),
    );
    let priority = optional_int_in_range(&mut errors, "priority", form.priority.as_deref(), 1, 10);
    let due_date = match form.due_date.as_deref().map(str::trim) {
        None => None,
        Some("") => Some(None),
        Some(raw) => match parse_due_date(raw) {
            Some(parsed) => Some(Some(parsed)),
            None => {
                add_error(&mut errors, "due_date", "Enter a valid date/time.");
                None
            }
        },
    };

    finish(errors, || TaskUpdate {
        title,
        description: form.description.trim().to_string(),
        estimated_pomodoros,
        priority,
        due_date,
    })
}

/// The explicit counter value of a progress update; blank means "no change".
pub fn parse_completed_pomodoros(raw: Option<&str>) -> Result<Option<i64>, String> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => match value.parse::<i64>() {
            Ok(count) if count >= 0 => Ok(Some(count)),
            _ => Err("completed_pomodoros must be a non-negative integer".to_string()),
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

pub fn validate_registration(form: &RegisterForm) -> Result<Registration, FieldErrors> {
    let mut errors = FieldErrors::new();
    let username = username(&mut errors, &form.username);
    let email = email(&mut errors, &form.email);
    let first_name = required_text(&mut errors, "first_name", &form.first_name, NAME_MAX_CHARS);
    let last_name = optional_text(&mut errors, "last_name", &form.last_name, NAME_MAX_CHARS);
    let password = new_password(&mut errors, "password2", &form.password1, &form.password2);
    finish(errors, || Registration {
        username,
        email,
        first_name,
        last_name,
        password,
    })
}

pub fn validate_login(form: &LoginForm) -> Result<(String, String), FieldErrors> {
    let mut errors = FieldErrors::new();
    let username = form.username.trim().to_string();
    if username.is_empty() {
        add_error(&mut errors, "username", REQUIRED);
    }
    if form.password.is_empty() {
        add_error(&mut errors, "password", REQUIRED);
    }
    finish(errors, || (username, form.password.clone()))
}

pub fn validate_user_info(form: &ProfileForm) -> Result<ProfileUpdate, FieldErrors> {
    let mut errors = FieldErrors::new();
    let username = username(&mut errors, &form.username);
    let email = email(&mut errors, &form.email);
    let first_name = optional_text(&mut errors, "first_name", &form.first_name, NAME_MAX_CHARS);
    let last_name = optional_text(&mut errors, "last_name", &form.last_name, NAME_MAX_CHARS);
    finish(errors, || ProfileUpdate {
        username,
        email,
        first_name,
        last_name,
    })
}

pub fn validate_settings(form: &ProfileForm) -> Result<SettingsUpdate, FieldErrors> {
    let mut errors = FieldErrors::new();
    let pomodoro_duration = int_in_range(&mut errors, "pomodoro_duration", &form.pomodoro_duration, 1, 60);
    let short_break_duration =
        int_in_range(&mut errors, "short_break_duration", &form.short_break_duration, 1, 30);
    let long_break_duration =
        int_in_range(&mut errors, "long_break_duration", &form.long_break_duration, 5, 60);
    let pomodoros_before_long_break = int_in_range(
        &mut errors,
        "pomodoros_before_long_break",
        &form.pomodoros_before_long_break,
        1,
        10,
    );
    finish(errors, || SettingsUpdate {
        pomodoro_duration,
        short_break_duration,
        long_break_duration,
        pomodoros_before_long_break,
    })
}

pub fn validate_set_password(form: &SetPasswordForm) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    let password = new_password(
        &mut errors,
        "new_password2",
        &form.new_password1,
        &form.new_password2,
    );
    finish(errors, || password)
}

pub fn validate_quadrant_edit(form: &QuadrantEditForm) -> Result<(i64, String), FieldErrors> {
    let mut errors = FieldErrors::new();
    let priority_order = int_in_range(&mut errors, "priority_order", &form.priority_order, 1, 4);
    let color_code = form.color_code.trim().to_string();
    if !COLOR_RE.is_match(&color_code) {
        add_error(&mut errors, "color_code", "Enter a color in #RRGGBB form.");
    }
    finish(errors, || (priority_order, color_code.to_uppercase()))
}

pub fn validate_stats(payload: &StatsPayload) -> Result<DailyStats, FieldErrors> {
    let mut errors = FieldErrors::new();
    for (field, score) in [
        ("focus_score", payload.focus_score),
        ("productivity_score", payload.productivity_score),
    ] {
        if !(0.0..=100.0).contains(&score) {
            add_error(&mut errors, field, "Ensure this value is between 0 and 100.");
        }
    }
    for (field, count) in [
        ("total_pomodoros_completed", payload.total_pomodoros_completed),
        ("total_tasks_completed", payload.total_tasks_completed),
        ("quadrant_2_time", payload.quadrant_2_time),
        ("planned_pomodoros", payload.planned_pomodoros),
        ("completed_on_time_tasks", payload.completed_on_time_tasks),
        ("interruptions_count", payload.interruptions_count),
    ] {
        if count < 0 {
            add_error(&mut errors, field, "Ensure this value is greater than or equal to 0.");
        }
    }
    if payload.time_spent_per_quadrant.values().any(|secs| *secs < 0) {
        add_error(
            &mut errors,
            "time_spent_per_quadrant",
            "Time spent cannot be negative.",
        );
    }
    finish(errors, || DailyStats {
        total_pomodoros_completed: payload.total_pomodoros_completed,
        total_tasks_completed: payload.total_tasks_completed,
        time_spent_per_quadrant: payload.time_spent_per_quadrant.clone(),
        quadrant_2_time: payload.quadrant_2_time,
        planned_pomodoros: payload.planned_pomodoros,
        completed_on_time_tasks: payload.completed_on_time_tasks,
        focus_score: payload.focus_score,
        productivity_score: payload.productivity_score,
        interruptions_count: payload.interruptions_count,
    })
}

/// Error shown when a login attempt fails, whatever the cause.
pub fn invalid_login() -> FieldErrors {
    let mut errors = FieldErrors::new();
    add_error(
        &mut errors,
        NON_FIELD_ERRORS,
        "Please enter a correct username and password. Note that both fields may be case-sensitive.",
    );
    errors
}
