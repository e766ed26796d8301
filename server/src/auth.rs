// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Password hashing, login sessions and the extractors that resolve the
//! current user from the `sessionid` cookie.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};
use argon2::Argon2;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, Method, StatusCode, header, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Duration, Utc};
use common::User;
use parking_lot::RwLock;
use tracing::{debug, warn};
use url::form_urlencoded;
use uuid::Uuid;

use crate::database::users;
use crate::error::AppError;
use crate::pages;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "sessionid";
pub const LOGIN_PATH: &str = "/users/login/";

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {}", e))
}

/// False for a wrong password and for a malformed stored hash alike.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LoginSession {
    user_id: i64,
    expires_at: DateTime<Utc>,
}

/// Login sessions keyed by cookie token. Lost on restart.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, LoginSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Opens a session for the user and returns its token.
    pub fn create(&self, user_id: i64) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let session = LoginSession {
            user_id,
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.write().insert(token.clone(), session);
        debug!("Opened login session for user {}", user_id);
        token
    }

    pub fn user_id_for(&self, token: &str) -> Option<i64> {
        let now = Utc::now();
        self.sessions
            .read()
            .get(token)
            .filter(|session| session.expires_at > now)
            .map(|session| session.user_id)
    }

    pub fn remove(&self, token: &str) -> bool {
        self.sessions.write().remove(token).is_some()
    }

    /// Ends every session of the user. Returns how many were open.
    pub fn revoke_user(&self, user_id: i64) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.user_id != user_id);
        before - sessions.len()
    }

    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        before - sessions.len()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `Set-Cookie` value that stores the session token.
pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// The session token carried by the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Accepts only local absolute paths, so `next` cannot send users off-site.
pub fn safe_redirect_target(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

/// Login page URL that returns to `path` afterwards.
pub fn login_url(path: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("next", path)
        .finish();
    format!("{}?{}", LOGIN_PATH, query)
}

/// Requests answered with JSON rather than a page.
fn expects_json(method: &Method, path: &str) -> bool {
    path.contains("/api/")
        || (method == Method::POST && (path.starts_with("/tasks/") || path.starts_with("/pomodoro/")))
}

/// Why an extractor refused the request.
#[derive(Debug)]
pub enum AuthRejection {
    /// Page request without a session: go to the login page.
    Login { next: String },
    /// JSON request without a session.
    Unauthorized,
    /// Signed in but not staff.
    Forbidden,
    Internal(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Login { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::Unauthorized => AppError::Unauthorized.into_response(),
            Self::Forbidden => (StatusCode::FORBIDDEN, Html(pages::forbidden())).into_response(),
            Self::Internal(err) => err.into_response(),
        }
    }
}

async fn load_user(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(token) = session_token(&parts.headers) else {
        return Ok(None);
    };
    let Some(user_id) = state.sessions.user_id_for(&token) else {
        return Ok(None);
    };
    Ok(users::get_user_by_id(&state.pool, user_id).await?)
}

fn anonymous_rejection(parts: &Parts) -> AuthRejection {
    let path = parts.uri.path();
    if expects_json(&parts.method, path) {
        AuthRejection::Unauthorized
    } else {
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| path.to_string());
        AuthRejection::Login { next }
    }
}

/// The signed-in user; anonymous requests are rejected.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match load_user(parts, state).await.map_err(AuthRejection::Internal)? {
            Some(user) => Ok(Self(user)),
            None => Err(anonymous_rejection(parts)),
        }
    }
}

/// The signed-in user, if any.
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(load_user(parts, state).await?))
    }
}

/// A signed-in staff member.
pub struct StaffUser(pub User);

impl FromRequestParts<AppState> for StaffUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.is_staff {
            Ok(Self(user))
        } else {
            warn!("User {} denied access to {}", user.username, parts.uri.path());
            Err(AuthRejection::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn test_session_store_lifecycle() {
        let store = SessionStore::new(Duration::hours(1));
        let first = store.create(1);
        let second = store.create(1);
        let other = store.create(2);
        assert_ne!(first, second);
        assert_eq!(store.user_id_for(&first), Some(1));
        assert_eq!(store.user_id_for("unknown"), None);

        assert!(store.remove(&first));
        assert_eq!(store.user_id_for(&first), None);

        assert_eq!(store.revoke_user(1), 1);
        assert_eq!(store.user_id_for(&second), None);
        assert_eq!(store.user_id_for(&other), Some(2));
    }

    #[test]
    fn test_expired_sessions_are_ignored_and_purged() {
        let store = SessionStore::new(Duration::seconds(-1));
        let token = store.create(7);
        assert_eq!(store.user_id_for(&token), None);
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("csrftoken=abc; sessionid=tok123; theme=dark"),
        );
        assert_eq!(session_token(&headers), Some("tok123".to_string()));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("sessionid="));
        assert_eq!(session_token(&empty), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("tok", Duration::hours(1), true);
        assert!(cookie.starts_with("sessionid=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));
        assert!(!session_cookie("tok", Duration::hours(1), false).contains("Secure"));
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn test_safe_redirect_target() {
        assert_eq!(safe_redirect_target(Some("/tasks/matrix/")), "/tasks/matrix/");
        assert_eq!(safe_redirect_target(Some("//evil.example")), "/");
        assert_eq!(safe_redirect_target(Some("https://evil.example")), "/");
        assert_eq!(safe_redirect_target(Some("/\\evil.example")), "/");
        assert_eq!(safe_redirect_target(Some("")), "/");
        assert_eq!(safe_redirect_target(None), "/");
    }

    #[test]
    fn test_login_url_encodes_next() {
        assert_eq!(
            login_url("/tasks/matrix/"),
            "/users/login/?next=%2Ftasks%2Fmatrix%2F"
        );
        let url = login_url("/admin/tasks/?q=a b&status=active");
        assert_eq!(
            url,
            "/users/login/?next=%2Fadmin%2Ftasks%2F%3Fq%3Da+b%26status%3Dactive"
        );

        // The login form reads the same path back.
        let query = url.split_once('?').unwrap().1;
        let next: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        assert_eq!(
            next,
            vec![("next".to_string(), "/admin/tasks/?q=a b&status=active".to_string())]
        );
    }

    #[test]
    fn test_json_requests() {
        assert!(expects_json(&Method::GET, "/analytics/api/stats/"));
        assert!(expects_json(&Method::POST, "/tasks/matrix/"));
        assert!(expects_json(&Method::POST, "/pomodoro/task/3/complete/"));
        assert!(!expects_json(&Method::GET, "/tasks/matrix/"));
        assert!(!expects_json(&Method::POST, "/users/profile/"));
    }
}
