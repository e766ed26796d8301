// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::{
    extract::{Form, Path, Query, State},
    http::{HeaderMap, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use common::{
    LoginForm, LoginQuery, PasswordResetRequestForm, ProfileForm, ProfileQuery, RegisterForm,
    SetPasswordForm, User,
};
use tracing::{debug, info, warn};

use crate::auth::{self, CurrentUser, MaybeUser};
use crate::database::{reset_tokens, users};
use crate::error::{AppError, FieldErrors, NON_FIELD_ERRORS};
use crate::forms::{self, EMAIL_TAKEN, USERNAME_TAKEN, add_error};
use crate::pages;
use crate::pages::users::ProfilePage;
use crate::state::AppState;

const PROFILE_UPDATED: &str = "/users/profile/?updated=1";

pub async fn register_page(MaybeUser(user): MaybeUser) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    Html(pages::users::register(&RegisterForm::default(), &FieldErrors::new())).into_response()
}

/// Creates an account (and its settings) then sends the user to the login page.
pub async fn register(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let (cleaned, mut errors) = match forms::validate_registration(&form) {
        Ok(cleaned) => (Some(cleaned), FieldErrors::new()),
        Err(errors) => (None, errors),
    };
    let username = form.username.trim();
    let email = form.email.trim();
    if !errors.contains_key("username") && users::username_taken(&state.pool, username, None).await? {
        add_error(&mut errors, "username", USERNAME_TAKEN);
    }
    if !errors.contains_key("email") && users::email_taken(&state.pool, email, None).await? {
        add_error(&mut errors, "email", EMAIL_TAKEN);
    }

    let cleaned = match cleaned {
        Some(cleaned) if errors.is_empty() => cleaned,
        _ => {
            debug!("Registration rejected: {:?}", errors.keys().collect::<Vec<_>>());
            return Ok(Html(pages::users::register(&form, &errors)).into_response());
        }
    };

    let password_hash = auth::hash_password(&cleaned.password)?;
    let created = users::create_user_in_db(
        &state.pool,
        users::NewUser {
            username: cleaned.username,
            email: cleaned.email,
            password_hash,
            first_name: cleaned.first_name,
            last_name: cleaned.last_name,
        },
    )
    .await?;

    info!("Registered user {} ({})", created.username, created.id);
    Ok(Redirect::to("/users/login/?registered=1").into_response())
}

/// A signed-in user skips the form and goes where the login would have sent them.
pub async fn login_page(MaybeUser(user): MaybeUser, Query(query): Query<LoginQuery>) -> Response {
    if user.is_some() {
        return Redirect::to(&auth::safe_redirect_target(query.next.as_deref())).into_response();
    }
    Html(pages::users::login(
        "",
        query.next.as_deref(),
        query.registered.is_some(),
        &FieldErrors::new(),
    ))
    .into_response()
}

/// Checks the credentials, opens a session and sets the `sessionid` cookie.
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if current.is_some() {
        return Ok(Redirect::to(&auth::safe_redirect_target(query.next.as_deref())).into_response());
    }

    let rerender = |errors: &FieldErrors| {
        Html(pages::users::login(&form.username, query.next.as_deref(), false, errors)).into_response()
    };

    let (username, password) = match forms::validate_login(&form) {
        Ok(credentials) => credentials,
        Err(errors) => return Ok(rerender(&errors)),
    };

    let user = users::get_user_by_username(&state.pool, &username).await?;
    let user = match user {
        Some(user) if auth::verify_password(&password, &user.password_hash) => user,
        _ => {
            warn!("Failed login attempt for '{}'", username);
            return Ok(rerender(&forms::invalid_login()));
        }
    };

    let token = state.sessions.create(user.id);
    users::record_login(&state.pool, user.id).await?;
    let cookie = auth::session_cookie(&token, state.sessions.ttl(), state.config.secure_cookies);
    let target = auth::safe_redirect_target(query.next.as_deref());

    info!("User {} logged in", user.username);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&target)).into_response())
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = auth::session_token(&headers) {
        if state.sessions.remove(&token) {
            debug!("Login session closed");
        }
    }
    (
        [(header::SET_COOKIE, auth::clear_session_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}

async fn render_profile(
    state: &AppState,
    user: &User,
    info: Option<(&ProfileForm, &FieldErrors)>,
    settings_form: Option<(&ProfileForm, &FieldErrors)>,
    updated: bool,
) -> Result<Html<String>, AppError> {
    let settings = users::get_or_create_settings(&state.pool, user.id).await?;
    let empty = FieldErrors::new();
    Ok(Html(pages::users::profile(&ProfilePage {
        user,
        settings: &settings,
        info: info.map(|(form, _)| form),
        info_errors: info.map(|(_, errors)| errors).unwrap_or(&empty),
        settings_form: settings_form.map(|(form, _)| form),
        settings_errors: settings_form.map(|(_, errors)| errors).unwrap_or(&empty),
        updated,
    })))
}

pub async fn profile_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ProfileQuery>,
) -> Result<Html<String>, AppError> {
    render_profile(&state, &user, None, None, query.updated.is_some()).await
}

/// Saves whichever of the two profile forms was posted, named by `form_type`.
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    match form.form_type.as_deref() {
        Some("user_info") => {
            let (cleaned, mut errors) = match forms::validate_user_info(&form) {
                Ok(cleaned) => (Some(cleaned), FieldErrors::new()),
                Err(errors) => (None, errors),
            };
            if !errors.contains_key("username")
                && users::username_taken(&state.pool, form.username.trim(), Some(user.id)).await?
            {
                add_error(&mut errors, "username", USERNAME_TAKEN);
            }
            if !errors.contains_key("email")
                && users::email_taken(&state.pool, form.email.trim(), Some(user.id)).await?
            {
                add_error(&mut errors, "email", EMAIL_TAKEN);
            }
            match cleaned {
                Some(update) if errors.is_empty() => {
                    users::update_profile_in_db(&state.pool, user.id, &update).await?;
                    info!("User {} updated their account details", user.id);
                    Ok(Redirect::to(PROFILE_UPDATED).into_response())
                }
                _ => Ok(render_profile(&state, &user, Some((&form, &errors)), None, false)
                    .await?
                    .into_response()),
            }
        }
        Some("user_settings") => match forms::validate_settings(&form) {
            Ok(update) => {
                users::update_settings_in_db(&state.pool, user.id, &update).await?;
                info!("User {} updated their timer settings", user.id);
                Ok(Redirect::to(PROFILE_UPDATED).into_response())
            }
            Err(errors) => Ok(render_profile(&state, &user, None, Some((&form, &errors)), false)
                .await?
                .into_response()),
        },
        other => {
            warn!("Profile form posted with form_type {:?}", other);
            let mut errors = FieldErrors::new();
            add_error(&mut errors, NON_FIELD_ERRORS, "Unknown form submitted.");
            Ok(render_profile(&state, &user, Some((&form, &errors)), None, false)
                .await?
                .into_response())
        }
    }
}

pub async fn password_reset_page() -> Html<String> {
    Html(pages::users::password_reset_request("", &FieldErrors::new()))
}

/// Issues a reset link when the address is known. The response is the same
/// either way, so the form does not reveal which emails have accounts.
pub async fn password_reset_request(
    State(state): State<AppState>,
    Form(form): Form<PasswordResetRequestForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim();
    if email.is_empty() {
        let mut errors = FieldErrors::new();
        add_error(&mut errors, "email", forms::REQUIRED);
        return Ok(Html(pages::users::password_reset_request(email, &errors)).into_response());
    }

    if let Some(user) = users::get_user_by_email(&state.pool, email).await? {
        let token = reset_tokens::create_reset_token(&state.pool, user.id).await?;
        info!(
            "Password reset link for {}: /users/reset/{}/",
            user.username, token
        );
    } else {
        debug!("Password reset requested for an unknown email");
    }
    Ok(Redirect::to("/users/password-reset/done/").into_response())
}

pub async fn password_reset_done() -> Html<String> {
    Html(pages::users::password_reset_sent())
}

pub async fn password_reset_confirm_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Html<String>, AppError> {
    let valid = reset_tokens::find_valid_reset_token(&state.pool, &token, state.config.reset_token_ttl)
        .await?
        .is_some();
    Ok(Html(pages::users::set_password(&token, valid, &FieldErrors::new())))
}

/// Sets the new password, spends the token and signs the user out everywhere.
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<SetPasswordForm>,
) -> Result<Response, AppError> {
    let ttl = state.config.reset_token_ttl;
    if reset_tokens::find_valid_reset_token(&state.pool, &token, ttl)
        .await?
        .is_none()
    {
        return Ok(Html(pages::users::set_password(&token, false, &FieldErrors::new())).into_response());
    }

    let password = match forms::validate_set_password(&form) {
        Ok(password) => password,
        Err(errors) => {
            return Ok(Html(pages::users::set_password(&token, true, &errors)).into_response());
        }
    };

    let hash = auth::hash_password(&password)?;
    match reset_tokens::consume_reset_token(&state.pool, &token, ttl, &hash).await? {
        Some(user_id) => {
            let revoked = state.sessions.revoke_user(user_id);
            info!("Closed {} login sessions of user {}", revoked, user_id);
            Ok(Redirect::to("/users/reset/done/").into_response())
        }
        None => Ok(Html(pages::users::set_password(&token, false, &FieldErrors::new())).into_response()),
    }
}

pub async fn password_reset_complete() -> Html<String> {
    Html(pages::users::password_reset_complete())
}
