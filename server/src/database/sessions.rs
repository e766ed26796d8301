// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use common::{PomodoroSession, SessionListing, SessionStatus, SessionType, TaskProgress};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

/// Sessions shown on the history page.
pub const HISTORY_LIMIT: i64 = 50;
/// Sessions shown on a task's timer page.
pub const RECENT_LIMIT: i64 = 5;
pub const ADMIN_SESSION_LIMIT: i64 = 200;

const LISTING_SELECT: &str = "SELECT s.*, t.title AS task_title, u.username AS username \
     FROM pomodoro_sessions s \
     JOIN tasks t ON t.id = s.task_id \
     JOIN users u ON u.id = s.user_id";

/// Outcome of ending a session.
#[derive(Debug, Clone)]
pub enum SessionEnd {
    Ended {
        session: PomodoroSession,
        /// Present when a completed work session advanced its task.
        progress: Option<TaskProgress>,
    },
    NotFound,
    AlreadyEnded,
}

#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub search: Option<String>,
    pub session_type: Option<SessionType>,
    pub status: Option<SessionStatus>,
}

/// Starts a session on a task owned by `user_id`.
///
/// Ownership is checked by the insert itself: nothing is written and `None`
/// is returned when the user has no such task.
pub async fn start_session_in_db(
    pool: &SqlitePool,
    user_id: i64,
    task_id: i64,
    session_type: SessionType,
) -> Result<Option<PomodoroSession>> {
    let session = sqlx::query_as::<_, PomodoroSession>(
        "INSERT INTO pomodoro_sessions (user_id, task_id, session_type, start_time, end_time, status) \
         SELECT user_id, id, ?, ?, NULL, 'completed' FROM tasks WHERE id = ? AND user_id = ? \
         RETURNING *",
    )
    .bind(session_type)
    .bind(Utc::now())
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to start session for task ID: {}", task_id))?;

    if let Some(session) = &session {
        info!(
            "{} session {} started on task {}",
            session.session_type.label(),
            session.id,
            task_id
        );
    }
    Ok(session)
}

/// Ends a running session and, for a completed work session, adds one
/// pomodoro to its task.
///
/// The guarded `UPDATE` is the first statement of the transaction, so it
/// takes the write lock before anything is read. A concurrent second end
/// waits for the first to commit and then matches no running row.
pub async fn end_session_in_db(
    pool: &SqlitePool,
    session_id: i64,
    user_id: i64,
    status: SessionStatus,
) -> Result<SessionEnd> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let now = Utc::now();

    let ended = sqlx::query_as::<_, PomodoroSession>(
        "UPDATE pomodoro_sessions SET status = ?, end_time = ? \
         WHERE id = ? AND user_id = ? AND end_time IS NULL RETURNING *",
    )
    .bind(status)
    .bind(now)
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await
    .with_context(|| format!("Failed to end session with ID: {}", session_id))?;

    let Some(session) = ended else {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pomodoro_sessions WHERE id = ? AND user_id = ?)",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("Failed to load session with ID: {}", session_id))?;
        tx.rollback().await.context("Failed to roll back session end")?;

        if exists {
            debug!("Session {} was already ended", session_id);
            return Ok(SessionEnd::AlreadyEnded);
        }
        return Ok(SessionEnd::NotFound);
    };

    let progress = if session.session_type == SessionType::Work && status == SessionStatus::Completed {
        let (completed, estimated): (i64, i64) = sqlx::query_as(
            "UPDATE tasks SET completed_pomodoros = completed_pomodoros + 1, updated_at = ? \
             WHERE id = ? RETURNING completed_pomodoros, estimated_pomodoros",
        )
        .bind(now)
        .bind(session.task_id)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("Failed to count pomodoro for task ID: {}", session.task_id))?;
        Some(TaskProgress::new(completed, estimated))
    } else {
        None
    };

    tx.commit().await.context("Failed to commit session end")?;

    info!(
        "Session {} ended as {} (task progress: {:?})",
        session.id, status, progress
    );
    Ok(SessionEnd::Ended { session, progress })
}

/// Sessions of one task started on `day` (UTC).
pub async fn count_sessions_on(
    pool: &SqlitePool,
    user_id: i64,
    task_id: i64,
    day: NaiveDate,
) -> Result<i64> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM pomodoro_sessions WHERE user_id = ? AND task_id = ? AND date(start_time) = ?",
    )
    .bind(user_id)
    .bind(task_id)
    .bind(day)
    .fetch_one(pool)
    .await
    .context("Failed to count today's sessions")
}

pub async fn recent_sessions_for_task(
    pool: &SqlitePool,
    user_id: i64,
    task_id: i64,
    limit: i64,
) -> Result<Vec<PomodoroSession>> {
    sqlx::query_as::<_, PomodoroSession>(
        "SELECT * FROM pomodoro_sessions WHERE user_id = ? AND task_id = ? \
         ORDER BY start_time DESC, id DESC LIMIT ?",
    )
    .bind(user_id)
    .bind(task_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to load recent sessions")
}

/// The user's latest sessions across all tasks, newest first.
pub async fn session_history(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<SessionListing>> {
    sqlx::query_as::<_, SessionListing>(&format!(
        "{} WHERE s.user_id = ? ORDER BY s.start_time DESC, s.id DESC LIMIT ?",
        LISTING_SELECT
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to load session history")
}

/// All users' sessions matching the filter, newest first.
pub async fn search_sessions(
    pool: &SqlitePool,
    filter: &SessionFilter,
) -> Result<Vec<SessionListing>> {
    let mut query = QueryBuilder::<Sqlite>::new(LISTING_SELECT);
    query.push(" WHERE 1 = 1");

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        query.push(" AND (t.title LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR u.username LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
    if let Some(session_type) = filter.session_type {
        query.push(" AND s.session_type = ");
        query.push_bind(session_type);
    }
    if let Some(status) = filter.status {
        query.push(" AND s.status = ");
        query.push_bind(status);
    }
    query.push(" ORDER BY s.start_time DESC, s.id DESC LIMIT ");
    query.push_bind(ADMIN_SESSION_LIMIT);

    query
        .build_query_as::<SessionListing>()
        .fetch_all(pool)
        .await
        .context("Failed to search sessions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::tasks::{NewTask, create_task_in_db, get_task_for_user};
    use crate::database::test_support::{create_test_user, setup_test_db};
    use common::Task;

    async fn task_for(pool: &SqlitePool, user_id: i64) -> Task {
        create_task_in_db(
            pool,
            NewTask {
                user_id,
                quadrant_id: None,
                title: "Focus".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap()
    }

    async fn completed_count(pool: &SqlitePool, task: &Task) -> i64 {
        get_task_for_user(pool, task.id, task.user_id)
            .await
            .unwrap()
            .unwrap()
            .completed_pomodoros
    }

    #[tokio::test]
    async fn test_start_session_requires_owned_task() {
        let pool = setup_test_db().await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        let task = task_for(&pool, alice.id).await;

        let session = start_session_in_db(&pool, alice.id, task.id, SessionType::Work)
            .await
            .unwrap()
            .unwrap();
        assert!(session.is_running());
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.task_id, task.id);

        assert!(
            start_session_in_db(&pool, bob.id, task.id, SessionType::Work)
                .await
                .unwrap()
                .is_none()
        );
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pomodoro_sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_completed_work_session_increments_by_one() {
        let pool = setup_test_db().await;
        let user = create_test_user(&pool, "alice").await;
        let task = task_for(&pool, user.id).await;
        let session = start_session_in_db(&pool, user.id, task.id, SessionType::Work)
            .await
            .unwrap()
            .unwrap();

        let outcome = end_session_in_db(&pool, session.id, user.id, SessionStatus::Completed)
            .await
            .unwrap();
        let SessionEnd::Ended { session, progress } = outcome else {
            panic!("expected the session to end");
        };
        assert!(session.end_time.is_some());
        assert_eq!(
            progress,
            Some(TaskProgress {
                completed: 1,
                total: 1,
                percentage: 100.0
            })
        );
        assert_eq!(completed_count(&pool, &task).await, 1);
    }

    #[tokio::test]
    async fn test_other_types_and_statuses_do_not_increment() {
        let pool = setup_test_db().await;
        let user = create_test_user(&pool, "alice").await;
        let task = task_for(&pool, user.id).await;

        let cases = [
            (SessionType::Work, SessionStatus::Interrupted),
            (SessionType::Work, SessionStatus::Cancelled),
            (SessionType::ShortBreak, SessionStatus::Completed),
            (SessionType::LongBreak, SessionStatus::Completed),
            (SessionType::ShortBreak, SessionStatus::Interrupted),
        ];
        for (session_type, status) in cases {
            let session = start_session_in_db(&pool, user.id, task.id, session_type)
                .await
                .unwrap()
                .unwrap();
            let outcome = end_session_in_db(&pool, session.id, user.id, status).await.unwrap();
            let SessionEnd::Ended { session, progress } = outcome else {
                panic!("expected the session to end");
            };
            assert_eq!(session.status, status);
            assert!(progress.is_none(), "{:?}/{:?} reported progress", session_type, status);
        }
        assert_eq!(completed_count(&pool, &task).await, 0);
    }

    #[tokio::test]
    async fn test_session_cannot_be_ended_twice() {
        let pool = setup_test_db().await;
        let user = create_test_user(&pool, "alice").await;
        let task = task_for(&pool, user.id).await;
        let session = start_session_in_db(&pool, user.id, task.id, SessionType::Work)
            .await
            .unwrap()
            .unwrap();

        end_session_in_db(&pool, session.id, user.id, SessionStatus::Completed)
            .await
            .unwrap();
        let again = end_session_in_db(&pool, session.id, user.id, SessionStatus::Completed)
            .await
            .unwrap();
        assert!(matches!(again, SessionEnd::AlreadyEnded));
        assert_eq!(completed_count(&pool, &task).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_ends_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("race.db").display());
        let pool = crate::database::establish_connection_pool(&url).await.unwrap();
        let user = create_test_user(&pool, "alice").await;
        let task = task_for(&pool, user.id).await;

        for _ in 0..20 {
            let session = start_session_in_db(&pool, user.id, task.id, SessionType::Work)
                .await
                .unwrap()
                .unwrap();
            let (first, second) = tokio::join!(
                end_session_in_db(&pool, session.id, user.id, SessionStatus::Completed),
                end_session_in_db(&pool, session.id, user.id, SessionStatus::Completed),
            );
            let outcomes = [first.unwrap(), second.unwrap()];
            let ended = outcomes
                .iter()
                .filter(|o| matches!(o, SessionEnd::Ended { .. }))
                .count();
            let already = outcomes
                .iter()
                .filter(|o| matches!(o, SessionEnd::AlreadyEnded))
                .count();
            assert_eq!((ended, already), (1, 1));
        }

        assert_eq!(completed_count(&pool, &task).await, 20);
        pool.close().await;
    }

    #[tokio::test]
    async fn test_other_users_session_is_not_found() {
        let pool = setup_test_db().await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        let task = task_for(&pool, alice.id).await;
        let session = start_session_in_db(&pool, alice.id, task.id, SessionType::Work)
            .await
            .unwrap()
            .unwrap();

        let outcome = end_session_in_db(&pool, session.id, bob.id, SessionStatus::Completed)
            .await
            .unwrap();
        assert!(matches!(outcome, SessionEnd::NotFound));
        assert_eq!(completed_count(&pool, &task).await, 0);
    }

    #[tokio::test]
    async fn test_counts_and_listings() {
        let pool = setup_test_db().await;
        let user = create_test_user(&pool, "alice").await;
        let task = task_for(&pool, user.id).await;
        for _ in 0..7 {
            start_session_in_db(&pool, user.id, task.id, SessionType::Work)
                .await
                .unwrap();
        }

        let today = Utc::now().date_naive();
        assert_eq!(count_sessions_on(&pool, user.id, task.id, today).await.unwrap(), 7);
        let yesterday = today.pred_opt().unwrap();
        assert_eq!(count_sessions_on(&pool, user.id, task.id, yesterday).await.unwrap(), 0);

        let recent = recent_sessions_for_task(&pool, user.id, task.id, RECENT_LIMIT).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert!(recent[0].id > recent[4].id);

        let history = session_history(&pool, user.id, HISTORY_LIMIT).await.unwrap();
        assert_eq!(history.len(), 7);
        assert_eq!(history[0].task_title, "Focus");
        assert_eq!(history[0].username, "alice");
    }

    #[tokio::test]
    async fn test_search_sessions() {
        let pool = setup_test_db().await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        let task_a = task_for(&pool, alice.id).await;
        let task_b = task_for(&pool, bob.id).await;
        start_session_in_db(&pool, alice.id, task_a.id, SessionType::Work).await.unwrap();
        let pause = start_session_in_db(&pool, bob.id, task_b.id, SessionType::ShortBreak)
            .await
            .unwrap()
            .unwrap();
        end_session_in_db(&pool, pause.id, bob.id, SessionStatus::Interrupted).await.unwrap();

        let by_user = search_sessions(
            &pool,
            &SessionFilter {
                search: Some("bob".to_string()),
                ..SessionFilter::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_user.len(), 1);

        let interrupted = search_sessions(
            &pool,
            &SessionFilter {
                search: None,
                session_type: Some(SessionType::ShortBreak),
                status: Some(SessionStatus::Interrupted),
            },
        )
        .await
        .unwrap();
        assert_eq!(interrupted.len(), 1);
        assert_eq!(interrupted[0].session.id, pause.id);

        let none = search_sessions(
            &pool,
            &SessionFilter {
                session_type: Some(SessionType::LongBreak),
                ..SessionFilter::default()
            },
        )
        .await
        .unwrap();
        assert!(none.is_empty());
    }
}
