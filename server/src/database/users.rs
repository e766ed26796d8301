// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::Utc;
use common::{
    DEFAULT_LONG_BREAK_MINUTES, DEFAULT_POMODORO_MINUTES, DEFAULT_POMODOROS_BEFORE_LONG_BREAK,
    DEFAULT_SHORT_BREAK_MINUTES, User, UserSettings,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// A validated registration, password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub pomodoro_duration: i64,
    pub short_break_duration: i64,
    pub long_break_duration: i64,
    pub pomodoros_before_long_break: i64,
}

impl Default for SettingsUpdate {
    fn default() -> Self {
        Self {
            pomodoro_duration: DEFAULT_POMODORO_MINUTES,
            short_break_duration: DEFAULT_SHORT_BREAK_MINUTES,
            long_break_duration: DEFAULT_LONG_BREAK_MINUTES,
            pomodoros_before_long_break: DEFAULT_POMODOROS_BEFORE_LONG_BREAK,
        }
    }
}

/// Inserts a user together with its default settings row.
///
/// Both rows are written in one transaction, so an account never exists
/// without its settings.
pub async fn create_user_in_db(pool: &SqlitePool, new_user: NewUser) -> Result<User> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, password_hash, first_name, last_name, is_staff, date_joined, last_login) \
         VALUES (?, ?, ?, ?, ?, 0, ?, NULL) RETURNING *",
    )
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .with_context(|| format!("Failed to insert user '{}'", new_user.username))?;

    let defaults = SettingsUpdate::default();
    sqlx::query(
        "INSERT INTO user_settings (user_id, pomodoro_duration, short_break_duration, long_break_duration, pomodoros_before_long_break) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(defaults.pomodoro_duration)
    .bind(defaults.short_break_duration)
    .bind(defaults.long_break_duration)
    .bind(defaults.pomodoros_before_long_break)
    .execute(&mut *tx)
    .await
    .context("Failed to create user settings")?;

    tx.commit().await.context("Failed to commit new user")?;
    info!("Created user '{}' with ID: {}", user.username, user.id);
    Ok(user)
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to load user with ID: {}", user_id))
}

pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to load user by username")
}

/// Email lookup, case-insensitive.
pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to load user by email")
}

/// Whether another account (not `exclude_id`) already uses this username.
pub async fn username_taken(
    pool: &SqlitePool,
    username: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ? AND id IS NOT ?")
            .bind(username)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
            .context("Failed to check username")?;
    Ok(count > 0)
}

/// Whether another account (not `exclude_id`) already uses this email.
pub async fn email_taken(pool: &SqlitePool, email: &str, exclude_id: Option<i64>) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ? AND id IS NOT ?")
            .bind(email)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
            .context("Failed to check email")?;
    Ok(count > 0)
}

pub async fn update_profile_in_db(
    pool: &SqlitePool,
    user_id: i64,
    update: &ProfileUpdate,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE users SET username = ?, email = ?, first_name = ?, last_name = ? WHERE id = ?",
    )
    .bind(&update.username)
    .bind(&update.email)
    .bind(&update.first_name)
    .bind(&update.last_name)
    .bind(user_id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update profile of user ID: {}", user_id))?;

    debug!("Updated profile of user ID: {}", user_id);
    Ok(result.rows_affected() > 0)
}

pub async fn update_password_hash(pool: &SqlitePool, user_id: i64, hash: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(hash)
        .bind(user_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update password of user ID: {}", user_id))?;
    Ok(result.rows_affected() > 0)
}

pub async fn record_login(pool: &SqlitePool, user_id: i64) -> Result<()> {
    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to record login time")?;
    Ok(())
}

/// Grants staff access to the named accounts. Unknown names are ignored.
pub async fn promote_staff(pool: &SqlitePool, usernames: &[String]) -> Result<u64> {
    let mut promoted = 0;
    for username in usernames {
        promoted += sqlx::query("UPDATE users SET is_staff = 1 WHERE username = ? AND is_staff = 0")
            .bind(username)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to promote '{}'", username))?
            .rows_affected();
    }
    Ok(promoted)
}

#[derive(sqlx::FromRow)]
struct UserWithSettingsRow {
    #[sqlx(flatten)]
    user: User,
    settings_id: Option<i64>,
    pomodoro_duration: Option<i64>,
    short_break_duration: Option<i64>,
    long_break_duration: Option<i64>,
    pomodoros_before_long_break: Option<i64>,
}

impl UserWithSettingsRow {
    fn into_pair(self) -> (User, Option<UserSettings>) {
        let settings = match (
            self.settings_id,
            self.pomodoro_duration,
            self.short_break_duration,
            self.long_break_duration,
            self.pomodoros_before_long_break,
        ) {
            (Some(id), Some(pomodoro), Some(short_break), Some(long_break), Some(before_long)) => {
                Some(UserSettings {
                    id,
                    user_id: self.user.id,
                    pomodoro_duration: pomodoro,
                    short_break_duration: short_break,
                    long_break_duration: long_break,
                    pomodoros_before_long_break: before_long,
                })
            }
            _ => None,
        };
        (self.user, settings)
    }
}

/// Every account with its settings row, if any, newest first.
pub async fn list_users_with_settings(pool: &SqlitePool) -> Result<Vec<(User, Option<UserSettings>)>> {
    let rows = sqlx::query_as::<_, UserWithSettingsRow>(
        "SELECT u.*, s.id AS settings_id, s.pomodoro_duration, s.short_break_duration, \
         s.long_break_duration, s.pomodoros_before_long_break \
         FROM users u LEFT JOIN user_settings s ON s.user_id = u.id \
         ORDER BY u.date_joined DESC, u.id DESC",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list users")?;

    Ok(rows.into_iter().map(UserWithSettingsRow::into_pair).collect())
}

pub async fn get_settings(pool: &SqlitePool, user_id: i64) -> Result<Option<UserSettings>> {
    sqlx::query_as::<_, UserSettings>("SELECT * FROM user_settings WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to load settings of user ID: {}", user_id))
}

/// Settings of a user, inserting the defaults when the row is missing.
pub async fn get_or_create_settings(pool: &SqlitePool, user_id: i64) -> Result<UserSettings> {
    sqlx::query("INSERT OR IGNORE INTO user_settings (user_id) VALUES (?)")
        .bind(user_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to provision settings of user ID: {}", user_id))?;

    get_settings(pool, user_id)
        .await?
        .with_context(|| format!("Settings of user ID {} vanished", user_id))
}

pub async fn update_settings_in_db(
    pool: &SqlitePool,
    user_id: i64,
    update: &SettingsUpdate,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE user_settings SET pomodoro_duration = ?, short_break_duration = ?, \
         long_break_duration = ?, pomodoros_before_long_break = ? WHERE user_id = ?",
    )
    .bind(update.pomodoro_duration)
    .bind(update.short_break_duration)
    .bind(update.long_break_duration)
    .bind(update.pomodoros_before_long_break)
    .bind(user_id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update settings of user ID: {}", user_id))?;

    debug!("Updated timer settings of user ID: {}", user_id);
    Ok(result.rows_affected() > 0)
}
