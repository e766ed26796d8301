// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use common::{
    AdminSessionQuery, AdminTaskQuery, Quadrant, SessionListing, SessionStatus, SessionType,
    TaskStatus, User, UserSettings,
};
use strum::IntoEnumIterator;

use super::{datetime, escape, field_errors, layout};
use crate::database::tasks::TaskListing;
use crate::error::FieldErrors;

fn select(name: &str, selected: Option<&str>, options: &[(String, String)]) -> String {
    let mut html = format!(r#"<select name="{}"><option value="">All</option>"#, name);
    for (value, label) in options {
        let marker = if selected == Some(value.as_str()) { " selected" } else { "" };
        html.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            escape(value),
            marker,
            escape(label)
        ));
    }
    html.push_str("</select>");
    html
}

pub fn index(user: &User) -> String {
    layout(
        "Administration",
        Some(user),
        r#"<h1>Administration</h1>
<ul>
<li><a href="/admin/tasks/">Tasks</a></li>
<li><a href="/admin/sessions/">Pomodoro sessions</a></li>
<li><a href="/admin/quadrants/">Quadrants</a></li>
<li><a href="/admin/users/">Users</a></li>
</ul>"#,
    )
}

pub fn tasks(user: &User, listings: &[TaskListing], query: &AdminTaskQuery, quadrants: &[Quadrant]) -> String {
    let mut quadrant_options = vec![("none".to_string(), "Unsorted".to_string())];
    quadrant_options.extend(quadrants.iter().map(|q| (q.id.to_string(), q.name.clone())));
    let status_options: Vec<(String, String)> = TaskStatus::iter()
        .map(|s| (s.to_string(), s.label().to_string()))
        .collect();

    let rows: String = listings
        .iter()
        .map(|listing| {
            let task = &listing.task;
            format!(
                r#"<tr><td><a href="/admin/tasks/{id}/">{title}</a></td><td>{user}</td><td>{quadrant}</td><td>{status}</td><td>{completed}/{estimated}</td><td>{created}</td></tr>"#,
                id = task.id,
                title = escape(&task.title),
                user = escape(&listing.username),
                quadrant = escape(listing.quadrant_name.as_deref().unwrap_or("-")),
                status = task.status.label(),
                completed = task.completed_pomodoros,
                estimated = task.estimated_pomodoros,
                created = datetime(Some(task.created_at)),
            )
        })
        .collect();

    let body = format!(
        r#"<h1>Tasks</h1>
<form method="get" action="/admin/tasks/">
<input type="search" name="q" value="{q}" placeholder="Title or description">
{quadrant}{status}
<button type="submit">Filter</button>
</form>
<p>{count} tasks</p>
<table><tr><th>Title</th><th>User</th><th>Quadrant</th><th>Status</th><th>Pomodoros</th><th>Created</th></tr>{rows}</table>"#,
        q = escape(query.q.as_deref().unwrap_or_default()),
        quadrant = select("quadrant", query.quadrant.as_deref(), &quadrant_options),
        status = select("status", query.status.as_deref(), &status_options),
        count = listings.len(),
        rows = rows,
    );
    layout("Tasks", Some(user), &body)
}

pub fn task_detail(user: &User, listing: &TaskListing) -> String {
    let task = &listing.task;
    let fields = [
        ("Title", escape(&task.title)),
        ("Description", escape(&task.description)),
        ("User", escape(&listing.username)),
        ("Quadrant", escape(listing.quadrant_name.as_deref().unwrap_or("-"))),
        ("Status", task.status.label().to_string()),
        ("Display order", task.display_order.to_string()),
        ("Priority", task.priority.to_string()),
        ("Due date", datetime(task.due_date)),
        ("Estimated pomodoros", task.estimated_pomodoros.to_string()),
        ("Completed pomodoros", task.completed_pomodoros.to_string()),
        ("Created", datetime(Some(task.created_at))),
        ("Updated", datetime(Some(task.updated_at))),
        ("Completed at", datetime(task.completed_at)),
    ];
    let rows: String = fields
        .iter()
        .map(|(label, value)| format!("<tr><th>{}</th><td>{}</td></tr>", label, value))
        .collect();
    layout(
        &task.title,
        Some(user),
        &format!(
            r#"<p><a href="/admin/tasks/">All tasks</a></p><h1>Task #{}</h1><table>{}</table>"#,
            task.id, rows
        ),
    )
}

pub fn sessions(user: &User, listings: &[SessionListing], query: &AdminSessionQuery) -> String {
    let type_options: Vec<(String, String)> = SessionType::iter()
        .map(|t| (t.to_string(), t.label().to_string()))
        .collect();
    let status_options: Vec<(String, String)> = SessionStatus::iter()
        .map(|s| (s.to_string(), s.label().to_string()))
        .collect();

    let rows: String = listings
        .iter()
        .map(|listing| {
            let session = &listing.session;
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&listing.username),
                escape(&listing.task_title),
                session.session_type.label(),
                datetime(Some(session.start_time)),
                datetime(session.end_time),
                session.status.label(),
            )
        })
        .collect();

    let body = format!(
        r#"<h1>Pomodoro sessions</h1>
<form method="get" action="/admin/sessions/">
<input type="search" name="q" value="{q}" placeholder="Task title or username">
{kind}{status}
<button type="submit">Filter</button>
</form>
<table><tr><th>User</th><th>Task</th><th>Type</th><th>Started</th><th>Ended</th><th>Status</th></tr>{rows}</table>"#,
        q = escape(query.q.as_deref().unwrap_or_default()),
        kind = select("session_type", query.session_type.as_deref(), &type_options),
        status = select("status", query.status.as_deref(), &status_options),
        rows = rows,
    );
    layout("Sessions", Some(user), &body)
}

/// Quadrant list with one edit form per row. `failed` carries the errors of
/// the quadrant whose last edit was rejected.
pub fn quadrants(user: &User, quadrants: &[Quadrant], failed: Option<(i64, &FieldErrors)>) -> String {
    let empty = FieldErrors::new();
    let rows: String = quadrants
        .iter()
        .map(|quadrant| {
            let errors = match failed {
                Some((id, errors)) if id == quadrant.id => errors,
                _ => &empty,
            };
            format!(
                r##"<tr><td>{name}</td><td>{icon}</td>
<td colspan="2"><form method="post" action="/admin/quadrants/{id}/">
<input type="number" name="priority_order" min="1" max="4" value="{order}">{order_errors}
<input type="text" name="color_code" value="{color}" pattern="#[0-9A-Fa-f]{{6}}">{color_errors}
<button type="submit">Save</button>
</form></td></tr>"##,
                id = quadrant.id,
                name = escape(&quadrant.name),
                icon = escape(&quadrant.icon),
                order = quadrant.priority_order,
                color = escape(&quadrant.color_code),
                order_errors = field_errors(errors, "priority_order"),
                color_errors = field_errors(errors, "color_code"),
            )
        })
        .collect();

    layout(
        "Quadrants",
        Some(user),
        &format!(
            r#"<h1>Quadrants</h1>
<table><tr><th>Name</th><th>Icon</th><th>Order</th><th>Color</th></tr>{}</table>"#,
            rows
        ),
    )
}

fn settings_cells(settings: Option<&UserSettings>) -> String {
    match settings {
        Some(s) => format!(
            "<td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
            s.pomodoro_duration,
            s.short_break_duration,
            s.long_break_duration,
            s.pomodoros_before_long_break
        ),
        None => r#"<td colspan="4">-</td>"#.to_string(),
    }
}

pub fn users(user: &User, accounts: &[(User, Option<UserSettings>)]) -> String {
    let rows: String = accounts
        .iter()
        .map(|(account, settings)| {
            format!(
                r#"<tr><td><a href="/admin/users/{id}/">{username}</a></td><td>{email}</td><td>{staff}</td><td>{joined}</td>{settings}</tr>"#,
                id = account.id,
                username = escape(&account.username),
                email = escape(&account.email),
                staff = if account.is_staff { "yes" } else { "no" },
                joined = datetime(Some(account.date_joined)),
                settings = settings_cells(settings.as_ref()),
            )
        })
        .collect();

    layout(
        "Users",
        Some(user),
        &format!(
            r#"<h1>Users</h1>
<table><tr><th>Username</th><th>Email</th><th>Staff</th><th>Joined</th><th>Pomodoro</th><th>Short break</th><th>Long break</th><th>Before long break</th></tr>{}</table>"#,
            rows
        ),
    )
}

pub fn user_detail(user: &User, account: &User, settings: Option<&UserSettings>) -> String {
    let body = format!(
        r#"<p><a href="/admin/users/">All users</a></p>
<h1>{username}</h1>
<table>
<tr><th>Email</th><td>{email}</td></tr>
<tr><th>Name</th><td>{name}</td></tr>
<tr><th>Staff</th><td>{staff}</td></tr>
<tr><th>Joined</th><td>{joined}</td></tr>
<tr><th>Last login</th><td>{last_login}</td></tr>
</table>
<h2>Settings</h2>
<table><tr><th>Pomodoro</th><th>Short break</th><th>Long break</th><th>Before long break</th></tr><tr>{settings}</tr></table>"#,
        username = escape(&account.username),
        email = escape(&account.email),
        name = escape(&format!("{} {}", account.first_name, account.last_name)),
        staff = if account.is_staff { "yes" } else { "no" },
        joined = datetime(Some(account.date_joined)),
        last_login = datetime(account.last_login),
        settings = settings_cells(settings),
    );
    layout(&account.username, Some(user), &body)
}
