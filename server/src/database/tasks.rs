// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::{Task, TaskStatus};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

/// Tasks shown per page in the administrative list.
pub const ADMIN_TASK_LIMIT: i64 = 200;

#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: i64,
    pub quadrant_id: Option<i64>,
    pub title: String,
    pub description: String,
}

/// Editable task fields. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub title: String,
    pub description: String,
    pub estimated_pomodoros: Option<i64>,
    pub priority: Option<i64>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// A task with the owner and quadrant names, for administrative listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskListing {
    #[sqlx(flatten)]
    pub task: Task,
    pub username: String,
    pub quadrant_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadrantFilter {
    Unassigned,
    Id(i64),
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub search: Option<String>,
    pub quadrant: Option<QuadrantFilter>,
    pub status: Option<TaskStatus>,
}

/// Inserts a new task at the end of its (user, quadrant) scope.
///
/// `display_order` is computed by the insert itself as one more than the
/// current maximum of the scope (1 for an empty scope).
pub async fn create_task_in_db(pool: &SqlitePool, new_task: NewTask) -> Result<Task> {
    let now = Utc::now();

    debug!(
        "Insert values: user_id={}, quadrant_id={:?}, title={}",
        new_task.user_id, new_task.quadrant_id, new_task.title
    );

    let task = sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (
            user_id, quadrant_id, title, description, status, display_order, priority,
            due_date, estimated_pomodoros, completed_pomodoros, created_at, updated_at, completed_at
        )
        VALUES (
            ?1, ?2, ?3, ?4, 'active',
            (SELECT COALESCE(MAX(display_order), 0) + 1 FROM tasks WHERE user_id = ?1 AND quadrant_id IS ?2),
            1, NULL, 1, 0, ?5, ?5, NULL
        )
        RETURNING *
        "#,
    )
    .bind(new_task.user_id)
    .bind(new_task.quadrant_id)
    .bind(&new_task.title)
    .bind(&new_task.description)
    .bind(now)
    .fetch_one(pool)
    .await
    .context("Failed to insert task into DB")?;

    info!(
        "Task {} created for user {} at position {}",
        task.id, task.user_id, task.display_order
    );
    Ok(task)
}

/// Loads a task only if it belongs to `user_id`.
pub async fn get_task_for_user(
    pool: &SqlitePool,
    task_id: i64,
    user_id: i64,
) -> Result<Option<Task>> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ? AND user_id = ?")
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to load task with ID: {}", task_id))
}

pub async fn get_task_by_id(pool: &SqlitePool, task_id: i64) -> Result<Option<TaskListing>> {
    sqlx::query_as::<_, TaskListing>(
        "SELECT t.*, u.username AS username, q.name AS quadrant_name FROM tasks t \
         JOIN users u ON u.id = t.user_id \
         LEFT JOIN quadrants q ON q.id = t.quadrant_id \
         WHERE t.id = ?",
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to load task with ID: {}", task_id))
}

/// Active tasks not yet placed in a quadrant, oldest first.
pub async fn list_unassigned_tasks(pool: &SqlitePool, user_id: i64) -> Result<Vec<Task>> {
    sqlx::query_as::<_, Task>(
        "SELECT * FROM tasks WHERE user_id = ? AND quadrant_id IS NULL AND status = 'active' \
         ORDER BY created_at ASC, id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve unassigned tasks from DB")
}

/// Active tasks placed in a quadrant, in matrix order.
///
/// Positions may repeat or have gaps; creation time breaks ties.
pub async fn list_assigned_tasks(pool: &SqlitePool, user_id: i64) -> Result<Vec<Task>> {
    sqlx::query_as::<_, Task>(
        "SELECT t.* FROM tasks t JOIN quadrants q ON q.id = t.quadrant_id \
         WHERE t.user_id = ? AND t.status = 'active' \
         ORDER BY q.priority_order ASC, t.display_order ASC, t.created_at ASC, t.id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve matrix tasks from DB")
}

pub async fn update_task_in_db(
    pool: &SqlitePool,
    task_id: i64,
    user_id: i64,
    update: &TaskUpdate,
) -> Result<Option<Task>> {
    let (touch_due_date, due_date) = match update.due_date {
        Some(value) => (true, value),
        None => (false, None),
    };

    let task = sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks SET
            title = ?,
            description = ?,
            estimated_pomodoros = COALESCE(?, estimated_pomodoros),
            priority = COALESCE(?, priority),
            due_date = CASE WHEN ? THEN ? ELSE due_date END,
            updated_at = ?
        WHERE id = ? AND user_id = ?
        RETURNING *
        "#,
    )
    .bind(&update.title)
    .bind(&update.description)
    .bind(update.estimated_pomodoros)
    .bind(update.priority)
    .bind(touch_due_date)
    .bind(due_date)
    .bind(Utc::now())
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to update task with ID: {}", task_id))?;

    if let Some(task) = &task {
        info!("Task updated: {} - {}", task.id, task.title);
    }
    Ok(task)
}

/// Deletes a task and, through the foreign key, its sessions.
/// Returns true if a task was deleted, false if the user owns no such task.
pub async fn delete_task_in_db(pool: &SqlitePool, task_id: i64, user_id: i64) -> Result<bool> {
    debug!("Attempting to delete task with ID: {}", task_id);
    let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
        .bind(task_id)
        .bind(user_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete task with ID: {}", task_id))?;

    let rows_affected = result.rows_affected();
    info!("Deleted {} rows for task ID: {}", rows_affected, task_id);
    Ok(rows_affected > 0)
}

/// Places a task in a quadrant (or back in the unassigned list) at a position.
///
/// Only the moved task changes; its neighbours keep their positions.
pub async fn move_task_in_db(
    pool: &SqlitePool,
    task_id: i64,
    user_id: i64,
    quadrant_id: Option<i64>,
    display_order: i64,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE tasks SET quadrant_id = ?, display_order = ?, updated_at = ? WHERE id = ? AND user_id = ?",
    )
    .bind(quadrant_id)
    .bind(display_order)
    .bind(Utc::now())
    .bind(task_id)
    .bind(user_id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to move task with ID: {}", task_id))?;

    info!(
        "Task {} moved to quadrant {:?} at position {}",
        task_id, quadrant_id, display_order
    );
    Ok(result.rows_affected() > 0)
}

/// Marks a task completed and stamps the completion time.
pub async fn complete_task_in_db(
    pool: &SqlitePool,
    task_id: i64,
    user_id: i64,
) -> Result<Option<Task>> {
    let now = Utc::now();
    let task = sqlx::query_as::<_, Task>(
        "UPDATE tasks SET status = 'completed', completed_at = ?, updated_at = ? \
         WHERE id = ? AND user_id = ? RETURNING *",
    )
    .bind(now)
    .bind(now)
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to complete task with ID: {}", task_id))?;

    if let Some(task) = &task {
        info!("Task completed successfully: {} - {}", task.id, task.title);
    }
    Ok(task)
}

/// Overwrites the completed-pomodoro counter of a task.
pub async fn set_completed_pomodoros(
    pool: &SqlitePool,
    task_id: i64,
    user_id: i64,
    completed: i64,
) -> Result<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(
        "UPDATE tasks SET completed_pomodoros = ?, updated_at = ? WHERE id = ? AND user_id = ? RETURNING *",
    )
    .bind(completed)
    .bind(Utc::now())
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to update progress of task with ID: {}", task_id))?;

    if let Some(task) = &task {
        info!("Task {} progress updated to {}", task.id, task.completed_pomodoros);
    }
    Ok(task)
}

/// All users' tasks matching the filter, newest first.
pub async fn search_tasks(pool: &SqlitePool, filter: &TaskFilter) -> Result<Vec<TaskListing>> {
    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT t.*, u.username AS username, q.name AS quadrant_name FROM tasks t \
         JOIN users u ON u.id = t.user_id \
         LEFT JOIN quadrants q ON q.id = t.quadrant_id \
         WHERE 1 = 1",
    );

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        query.push(" AND (t.title LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR t.description LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
    match filter.quadrant {
        Some(QuadrantFilter::Unassigned) => {
            query.push(" AND t.quadrant_id IS NULL");
        }
        Some(QuadrantFilter::Id(id)) => {
            query.push(" AND t.quadrant_id = ");
            query.push_bind(id);
        }
        None => {}
    }
    if let Some(status) = filter.status {
        query.push(" AND t.status = ");
        query.push_bind(status);
    }
    query.push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ");
    query.push_bind(ADMIN_TASK_LIMIT);

    query
        .build_query_as::<TaskListing>()
        .fetch_all(pool)
        .await
        .context("Failed to search tasks")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::quadrants::list_quadrants;
    use crate::database::test_support::{create_test_user, setup_test_db};

    fn new_task(user_id: i64, quadrant_id: Option<i64>, title: &str) -> NewTask {
        NewTask {
            user_id,
            quadrant_id,
            title: title.to_string(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_task_defaults() {
        let pool = setup_test_db().await;
        let user = create_test_user(&pool, "alice").await;

        let task = create_task_in_db(
            &pool,
            NewTask {
                user_id: user.id,
                quadrant_id: None,
                title: "Write report".to_string(),
                description: "Quarterly numbers".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(task.id > 0);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description, "Quarterly numbers");
        assert_eq!(task.status, TaskStatus::Active);
        assert_eq!(task.quadrant_id, None);
        assert_eq!(task.priority, 1);
        assert_eq!(task.estimated_pomodoros, 1);
        assert_eq!(task.completed_pomodoros, 0);
        assert_eq!(task.display_order, 1);
        assert!(task.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_display_order_is_max_plus_one_per_scope() {
        let pool = setup_test_db().await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        let quadrants = list_quadrants(&pool).await.unwrap();
        let q1 = quadrants[0].id;
        let q2 = quadrants[1].id;

        let first = create_task_in_db(&pool, new_task(alice.id, Some(q1), "a")).await.unwrap();
        let second = create_task_in_db(&pool, new_task(alice.id, Some(q1), "b")).await.unwrap();
        assert_eq!(first.display_order, 1);
        assert_eq!(second.display_order, 2);

        // Other quadrant, other user and the unassigned list are separate scopes.
        let other_quadrant = create_task_in_db(&pool, new_task(alice.id, Some(q2), "c")).await.unwrap();
        let other_user = create_task_in_db(&pool, new_task(bob.id, Some(q1), "d")).await.unwrap();
        let unassigned = create_task_in_db(&pool, new_task(alice.id, None, "e")).await.unwrap();
        assert_eq!(other_quadrant.display_order, 1);
        assert_eq!(other_user.display_order, 1);
        assert_eq!(unassigned.display_order, 1);

        // A gap left by a manual move is continued from the maximum.
        move_task_in_db(&pool, second.id, alice.id, Some(q1), 10).await.unwrap();
        let after_gap = create_task_in_db(&pool, new_task(alice.id, Some(q1), "f")).await.unwrap();
        assert_eq!(after_gap.display_order, 11);
    }

    #[tokio::test]
    async fn test_matrix_listing_order() {
        let pool = setup_test_db().await;
        let user = create_test_user(&pool, "alice").await;
        let quadrants = list_quadrants(&pool).await.unwrap();

        let late = create_task_in_db(&pool, new_task(user.id, Some(quadrants[2].id), "q3")).await.unwrap();
        let second = create_task_in_db(&pool, new_task(user.id, Some(quadrants[0].id), "q1-b")).await.unwrap();
        let first = create_task_in_db(&pool, new_task(user.id, Some(quadrants[0].id), "q1-a")).await.unwrap();
        move_task_in_db(&pool, first.id, user.id, Some(quadrants[0].id), 0).await.unwrap();
        let loose = create_task_in_db(&pool, new_task(user.id, None, "loose")).await.unwrap();

        let assigned: Vec<i64> = list_assigned_tasks(&pool, user.id)
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(assigned, vec![first.id, second.id, late.id]);

        let unassigned = list_unassigned_tasks(&pool, user.id).await.unwrap();
        assert_eq!(unassigned.len(), 1);
        assert_eq!(unassigned[0].id, loose.id);
    }

    #[tokio::test]
    async fn test_move_back_to_unassigned() {
        let pool = setup_test_db().await;
        let user = create_test_user(&pool, "alice").await;
        let quadrant = list_quadrants(&pool).await.unwrap().remove(0);
        let task = create_task_in_db(&pool, new_task(user.id, Some(quadrant.id), "t")).await.unwrap();

        assert!(move_task_in_db(&pool, task.id, user.id, None, 0).await.unwrap());
        let moved = get_task_for_user(&pool, task.id, user.id).await.unwrap().unwrap();
        assert_eq!(moved.quadrant_id, None);
        assert_eq!(moved.display_order, 0);
    }

    #[tokio::test]
    async fn test_other_users_tasks_are_invisible() {
        let pool = setup_test_db().await;
        let alice = create_test_user(&pool, "alice").await;
        let mallory = create_test_user(&pool, "mallory").await;
        let task = create_task_in_db(&pool, new_task(alice.id, None, "private")).await.unwrap();

        assert!(get_task_for_user(&pool, task.id, mallory.id).await.unwrap().is_none());
        assert!(!delete_task_in_db(&pool, task.id, mallory.id).await.unwrap());
        assert!(!move_task_in_db(&pool, task.id, mallory.id, None, 3).await.unwrap());
        assert!(complete_task_in_db(&pool, task.id, mallory.id).await.unwrap().is_none());
        let update = TaskUpdate {
            title: "hijacked".to_string(),
            ..TaskUpdate::default()
        };
        assert!(update_task_in_db(&pool, task.id, mallory.id, &update).await.unwrap().is_none());
        assert!(set_completed_pomodoros(&pool, task.id, mallory.id, 7).await.unwrap().is_none());

        let untouched = get_task_for_user(&pool, task.id, alice.id).await.unwrap().unwrap();
        assert_eq!(untouched.title, "private");
        assert_eq!(untouched.status, TaskStatus::Active);
        assert_eq!(untouched.completed_pomodoros, 0);
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let pool = setup_test_db().await;
        let user = create_test_user(&pool, "alice").await;
        let task = create_task_in_db(&pool, new_task(user.id, None, "draft")).await.unwrap();

        let due = Utc::now();
        let updated = update_task_in_db(
            &pool,
            task.id,
            user.id,
            &TaskUpdate {
                title: "final".to_string(),
                description: "done right".to_string(),
                estimated_pomodoros: Some(4),
                priority: None,
                due_date: Some(Some(due)),
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.title, "final");
        assert_eq!(updated.estimated_pomodoros, 4);
        assert_eq!(updated.priority, 1);
        assert!(updated.due_date.is_some());

        let cleared = update_task_in_db(
            &pool,
            task.id,
            user.id,
            &TaskUpdate {
                title: "final".to_string(),
                description: String::new(),
                estimated_pomodoros: None,
                priority: Some(7),
                due_date: Some(None),
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(cleared.estimated_pomodoros, 4);
        assert_eq!(cleared.priority, 7);
        assert!(cleared.due_date.is_none());
    }

    #[tokio::test]
    async fn test_complete_and_set_progress() {
        let pool = setup_test_db().await;
        let user = create_test_user(&pool, "alice").await;
        let task = create_task_in_db(&pool, new_task(user.id, None, "t")).await.unwrap();

        let progressed = set_completed_pomodoros(&pool, task.id, user.id, 3).await.unwrap().unwrap();
        assert_eq!(progressed.completed_pomodoros, 3);

        let completed = complete_task_in_db(&pool, task.id, user.id).await.unwrap().unwrap();
        assert_eq!(completed.status, TaskStatus::Completed);
        assert!(completed.completed_at.is_some());

        // Completed tasks leave the matrix.
        assert!(list_unassigned_tasks(&pool, user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_tasks_filters() {
        let pool = setup_test_db().await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;
        let quadrant = list_quadrants(&pool).await.unwrap().remove(0);

        create_task_in_db(&pool, new_task(alice.id, Some(quadrant.id), "Budget review")).await.unwrap();
        let loose = create_task_in_db(&pool, new_task(bob.id, None, "Call plumber")).await.unwrap();
        complete_task_in_db(&pool, loose.id, bob.id).await.unwrap();

        let all = search_tasks(&pool, &TaskFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let by_text = search_tasks(
            &pool,
            &TaskFilter {
                search: Some("budget".to_string()),
                ..TaskFilter::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_text.len(), 1);
        assert_eq!(by_text[0].username, "alice");
        assert_eq!(by_text[0].quadrant_name.as_deref(), Some(quadrant.name.as_str()));

        let unassigned_completed = search_tasks(
            &pool,
            &TaskFilter {
                search: None,
                quadrant: Some(QuadrantFilter::Unassigned),
                status: Some(TaskStatus::Completed),
            },
        )
        .await
        .unwrap();
        assert_eq!(unassigned_completed.len(), 1);
        assert_eq!(unassigned_completed[0].task.id, loose.id);
    }
}
