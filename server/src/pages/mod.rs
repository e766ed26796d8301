// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Server-rendered HTML. Every value coming from users goes through [`escape`].
pub mod admin;
pub mod pomodoro;
pub mod site;
pub mod tasks;
pub mod users;

use common::User;

use crate::error::{FieldErrors, NON_FIELD_ERRORS};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f6f7f9; color: #222; }
nav { background: #2d3142; padding: .6rem 1rem; display: flex; gap: 1rem; align-items: center; }
nav a { color: #fff; text-decoration: none; }
nav .spacer { flex: 1; }
main { max-width: 1100px; margin: 1.5rem auto; padding: 0 1rem; }
.errorlist { color: #c0392b; list-style: none; padding: 0; margin: .2rem 0; }
.notice { background: #e8f6ef; border: 1px solid #96CEB4; padding: .6rem; }
.matrix { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; }
.quadrant, .pool { border-radius: 6px; padding: .8rem; min-height: 140px; background: #fff; }
.task { background: #fff; border: 1px solid #ddd; border-radius: 4px; padding: .4rem; margin: .3rem 0; cursor: grab; }
table { border-collapse: collapse; width: 100%; background: #fff; }
th, td { border: 1px solid #ddd; padding: .35rem .5rem; text-align: left; }
form.inline { display: inline; }
"#;

/// Escapes text for HTML element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wraps a page body with the document head and the navigation bar.
pub fn layout(title: &str, user: Option<&User>, body: &str) -> String {
    let account = match user {
        Some(user) => {
            let admin = if user.is_staff {
                r#"<a href="/admin/">Admin</a>"#
            } else {
                ""
            };
            format!(
                r#"<a href="/tasks/matrix/">Matrix</a>
<a href="/pomodoro/sessions/">Sessions</a>
<span class="spacer"></span>
{admin}
<a href="/users/profile/">{name}</a>
<form class="inline" method="post" action="/users/logout/"><button type="submit">Log out</button></form>"#,
                admin = admin,
                name = escape(&user.display_name()),
            )
        }
        None => r#"<span class="spacer"></span>
<a href="/users/login/">Log in</a>
<a href="/users/register/">Register</a>"#
            .to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | TaskFocus</title>
<style>{style}</style>
</head>
<body>
<nav>
<a href="/"><strong>TaskFocus</strong></a>
<a href="/eisenhower-method/">Eisenhower method</a>
<a href="/pomodoro-technique/">Pomodoro technique</a>
{account}
</nav>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
        style = STYLE,
        account = account,
        body = body,
    )
}

/// `<ul class="errorlist">` for one field, empty when the field is fine.
pub fn field_errors(errors: &FieldErrors, field: &str) -> String {
    match errors.get(field) {
        Some(messages) if !messages.is_empty() => {
            let items: String = messages
                .iter()
                .map(|message| format!("<li>{}</li>", escape(message)))
                .collect();
            format!(r#"<ul class="errorlist">{}</ul>"#, items)
        }
        _ => String::new(),
    }
}

pub fn form_errors(errors: &FieldErrors) -> String {
    field_errors(errors, NON_FIELD_ERRORS)
}

/// A labelled `<input>` with its errors.
pub fn input(label: &str, name: &str, kind: &str, value: &str, errors: &FieldErrors) -> String {
    format!(
        r#"<p><label for="id_{name}">{label}</label><br>
<input type="{kind}" name="{name}" id="id_{name}" value="{value}">
{errors}</p>"#,
        name = name,
        label = escape(label),
        kind = kind,
        value = escape(value),
        errors = field_errors(errors, name),
    )
}

pub fn notice(message: &str) -> String {
    format!(r#"<p class="notice">{}</p>"#, escape(message))
}

pub fn not_found(message: &str) -> String {
    layout(
        "Not found",
        None,
        &format!(
            r#"<h1>Not found</h1><p>{}</p><p><a href="/">Back home</a></p>"#,
            escape(message)
        ),
    )
}

pub fn forbidden() -> String {
    layout(
        "Forbidden",
        None,
        r#"<h1>Forbidden</h1><p>You do not have permission to view this page.</p>"#,
    )
}

/// Formats an optional timestamp for tables.
pub fn datetime(value: Option<chrono::DateTime<chrono::Utc>>) -> String {
    value
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
