// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
pub mod quadrants;
pub mod reset_tokens;
pub mod sessions;
pub mod stats;
pub mod tasks;
pub mod users;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, migrate::MigrateDatabase};
use tracing::{debug, info};

/// Table definitions, applied in order on every start.
const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password_hash TEXT NOT NULL,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            is_staff BOOLEAN NOT NULL DEFAULT 0,
            date_joined TIMESTAMP NOT NULL,
            last_login TIMESTAMP NULL
        );
        "#,
    ),
    (
        "user_settings",
        r#"
        CREATE TABLE IF NOT EXISTS user_settings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            pomodoro_duration INTEGER NOT NULL DEFAULT 25,
            short_break_duration INTEGER NOT NULL DEFAULT 5,
            long_break_duration INTEGER NOT NULL DEFAULT 15,
            pomodoros_before_long_break INTEGER NOT NULL DEFAULT 4
        );
        "#,
    ),
    (
        "quadrants",
        r#"
        CREATE TABLE IF NOT EXISTS quadrants (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            priority_order INTEGER NOT NULL,
            color_code TEXT NOT NULL DEFAULT '#FFFFFF',
            icon TEXT NOT NULL DEFAULT ''
        );
        "#,
    ),
    (
        "tasks",
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            quadrant_id INTEGER NULL REFERENCES quadrants(id) ON DELETE RESTRICT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'active'
                CHECK (status IN ('active', 'completed', 'cancelled')),
            display_order INTEGER NOT NULL DEFAULT 0,
            priority INTEGER NOT NULL DEFAULT 1,
            due_date TIMESTAMP NULL,
            estimated_pomodoros INTEGER NOT NULL DEFAULT 1,
            completed_pomodoros INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            completed_at TIMESTAMP NULL
        );
        "#,
    ),
    (
        "tasks index",
        "CREATE INDEX IF NOT EXISTS idx_tasks_user_quadrant ON tasks (user_id, quadrant_id);",
    ),
    (
        "pomodoro_sessions",
        r#"
        CREATE TABLE IF NOT EXISTS pomodoro_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            session_type TEXT NOT NULL DEFAULT 'work'
                CHECK (session_type IN ('work', 'short_break', 'long_break')),
            start_time TIMESTAMP NOT NULL,
            end_time TIMESTAMP NULL,
            status TEXT NOT NULL DEFAULT 'completed'
                CHECK (status IN ('completed', 'interrupted', 'cancelled'))
        );
        "#,
    ),
    (
        "pomodoro_sessions index",
        "CREATE INDEX IF NOT EXISTS idx_sessions_user_start ON pomodoro_sessions (user_id, start_time);",
    ),
    (
        "productivity_stats",
        r#"
        CREATE TABLE IF NOT EXISTS productivity_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            date DATE NOT NULL,
            total_pomodoros_completed INTEGER NOT NULL DEFAULT 0,
            total_tasks_completed INTEGER NOT NULL DEFAULT 0,
            time_spent_per_quadrant TEXT NOT NULL DEFAULT '{}',
            quadrant_2_time INTEGER NOT NULL DEFAULT 0,
            planned_pomodoros INTEGER NOT NULL DEFAULT 0,
            completed_on_time_tasks INTEGER NOT NULL DEFAULT 0,
            focus_score REAL NOT NULL DEFAULT 0,
            productivity_score REAL NOT NULL DEFAULT 0,
            interruptions_count INTEGER NOT NULL DEFAULT 0,
            UNIQUE (user_id, date)
        );
        "#,
    ),
    (
        "password_reset_tokens",
        r#"
        CREATE TABLE IF NOT EXISTS password_reset_tokens (
            token TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL,
            used_at TIMESTAMP NULL
        );
        "#,
    ),
];

/// Establishes the database connection pool.
/// If the database does not exist, it creates it (including its directory),
/// then brings the schema and the quadrant rows up to date.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        if let Some(parent) = database_file_path(database_url).and_then(|p| p.parent().map(PathBuf::from)) {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(&parent)
                    .await
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let options = SqliteConnectOptions::from_str(database_url)
        .context("Invalid database URL")?
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(options)
        .await
        .context("Failed to connect to database")?;

    init_schema(&pool).await?;
    Ok(pool)
}

/// A private in-memory database on a single connection.
///
/// Every pooled connection to `sqlite::memory:` would open its own empty
/// database, so the pool is capped at one connection that never expires.
pub async fn establish_in_memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .context("Invalid in-memory database URL")?
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("Failed to open in-memory database")?;

    init_schema(&pool).await?;
    Ok(pool)
}

/// Creates missing tables and seeds the four quadrants.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for (name, statement) in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create '{}'", name))?;
        debug!("'{}' is ready.", name);
    }

    let seeded = quadrants::seed_default_quadrants(pool).await?;
    if seeded > 0 {
        info!("Seeded {} quadrants.", seeded);
    }
    Ok(())
}

/// File path behind a `sqlite:` URL, `None` for in-memory databases.
fn database_file_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::database::users::{NewUser, create_user_in_db};
    use common::User;

    /// Fresh database with the full schema, isolated per test.
    pub async fn setup_test_db() -> SqlitePool {
        establish_in_memory_pool()
            .await
            .expect("Failed to set up in-memory database")
    }

    pub async fn create_test_user(pool: &SqlitePool, username: &str) -> User {
        create_user_in_db(
            pool,
            NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash: "not-a-real-hash".to_string(),
                first_name: username.to_string(),
                last_name: String::new(),
            },
        )
        .await
        .expect("Failed to create test user")
    }
}
