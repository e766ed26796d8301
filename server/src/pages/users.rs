// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use common::{ProfileForm, RegisterForm, User, UserSettings};

use super::{escape, form_errors, input, layout, notice};
use crate::error::FieldErrors;

pub fn register(form: &RegisterForm, errors: &FieldErrors) -> String {
    let body = format!(
        r#"<h1>Create an account</h1>
<form method="post" action="/users/register/">
{all}
{username}{email}{first}{last}{password1}{password2}
<button type="submit">Register</button>
</form>
<p>Already registered? <a href="/users/login/">Log in</a>.</p>"#,
        all = form_errors(errors),
        username = input("Username", "username", "text", &form.username, errors),
        email = input("Email", "email", "email", &form.email, errors),
        first = input("First name", "first_name", "text", &form.first_name, errors),
        last = input("Last name", "last_name", "text", &form.last_name, errors),
        password1 = input("Password", "password1", "password", "", errors),
        password2 = input("Password confirmation", "password2", "password", "", errors),
    );
    layout("Register", None, &body)
}

pub fn login(username: &str, next: Option<&str>, registered: bool, errors: &FieldErrors) -> String {
    let next_field = next
        .map(|next| format!(r#"<input type="hidden" name="next" value="{}">"#, escape(next)))
        .unwrap_or_default();
    let action = match next {
        Some(next) => crate::auth::login_url(next),
        None => crate::auth::LOGIN_PATH.to_string(),
    };
    let body = format!(
        r#"<h1>Log in</h1>
{registered}
<form method="post" action="{action}">
{all}
{username}{password}
{next_field}
<button type="submit">Log in</button>
</form>
<p><a href="/users/password-reset/">Forgot your password?</a></p>"#,
        registered = if registered {
            notice("Your account was created. You can now log in.")
        } else {
            String::new()
        },
        action = escape(&action),
        all = form_errors(errors),
        username = input("Username", "username", "text", username, errors),
        password = input("Password", "password", "password", "", errors),
        next_field = next_field,
    );
    layout("Log in", None, &body)
}

/// State of the profile page; `info`/`settings` hold submitted values when
/// that form failed validation.
pub struct ProfilePage<'a> {
    pub user: &'a User,
    pub settings: &'a UserSettings,
    pub info: Option<&'a ProfileForm>,
    pub info_errors: &'a FieldErrors,
    pub settings_form: Option<&'a ProfileForm>,
    pub settings_errors: &'a FieldErrors,
    pub updated: bool,
}

pub fn profile(page: &ProfilePage<'_>) -> String {
    let user = page.user;
    let (username, email, first_name, last_name) = match page.info {
        Some(form) => (
            form.username.clone(),
            form.email.clone(),
            form.first_name.clone(),
            form.last_name.clone(),
        ),
        None => (
            user.username.clone(),
            user.email.clone(),
            user.first_name.clone(),
            user.last_name.clone(),
        ),
    };
    let durations = match page.settings_form {
        Some(form) => [
            form.pomodoro_duration.clone(),
            form.short_break_duration.clone(),
            form.long_break_duration.clone(),
            form.pomodoros_before_long_break.clone(),
        ],
        None => [
            page.settings.pomodoro_duration.to_string(),
            page.settings.short_break_duration.to_string(),
            page.settings.long_break_duration.to_string(),
            page.settings.pomodoros_before_long_break.to_string(),
        ],
    };
    let info_errors = page.info_errors;
    let settings_errors = page.settings_errors;

    let body = format!(
        r#"<h1>Profile</h1>
{updated}
<h2>Account</h2>
<form method="post" action="/users/profile/">
<input type="hidden" name="form_type" value="user_info">
{info_all}{username}{email}{first}{last}
<button type="submit">Save account</button>
</form>
<h2>Timer settings</h2>
<form method="post" action="/users/profile/">
<input type="hidden" name="form_type" value="user_settings">
{settings_all}{pomodoro}{short}{long}{cycles}
<button type="submit">Save settings</button>
</form>"#,
        updated = if page.updated {
            notice("Your profile was updated.")
        } else {
            String::new()
        },
        info_all = form_errors(info_errors),
        username = input("Username", "username", "text", &username, info_errors),
        email = input("Email", "email", "email", &email, info_errors),
        first = input("First name", "first_name", "text", &first_name, info_errors),
        last = input("Last name", "last_name", "text", &last_name, info_errors),
        settings_all = form_errors(settings_errors),
        pomodoro = input("Pomodoro (minutes)", "pomodoro_duration", "number", &durations[0], settings_errors),
        short = input("Short break (minutes)", "short_break_duration", "number", &durations[1], settings_errors),
        long = input("Long break (minutes)", "long_break_duration", "number", &durations[2], settings_errors),
        cycles = input(
            "Pomodoros before a long break",
            "pomodoros_before_long_break",
            "number",
            &durations[3],
            settings_errors
        ),
    );
    layout("Profile", Some(user), &body)
}

pub fn password_reset_request(email: &str, errors: &FieldErrors) -> String {
    let body = format!(
        r#"<h1>Reset your password</h1>
<p>Enter the email address of your account and we will send you a reset link.</p>
<form method="post" action="/users/password-reset/">
{email}
<button type="submit">Send reset link</button>
</form>"#,
        email = input("Email", "email", "email", email, errors),
    );
    layout("Password reset", None, &body)
}

pub fn password_reset_sent() -> String {
    layout(
        "Password reset sent",
        None,
        r#"<h1>Check your inbox</h1>
<p>If an account exists for that address, a link to reset its password has been sent.</p>"#,
    )
}

/// The new-password form; `valid` is false for unknown, used or expired links.
pub fn set_password(token: &str, valid: bool, errors: &FieldErrors) -> String {
    let body = if valid {
        format!(
            r#"<h1>Choose a new password</h1>
<form method="post" action="/users/reset/{token}/">
{all}{first}{second}
<button type="submit">Change password</button>
</form>"#,
            token = escape(token),
            all = form_errors(errors),
            first = input("New password", "new_password1", "password", "", errors),
            second = input("New password confirmation", "new_password2", "password", "", errors),
        )
    } else {
        r#"<h1>Invalid link</h1>
<p>This password reset link is invalid, possibly because it has already been used or has expired.
<a href="/users/password-reset/">Request a new one</a>.</p>"#
            .to_string()
    };
    layout("Set password", None, &body)
}

pub fn password_reset_complete() -> String {
    layout(
        "Password changed",
        None,
        r#"<h1>Password changed</h1>
<p>Your password has been set. <a href="/users/login/">Log in</a>.</p>"#,
    )
}
