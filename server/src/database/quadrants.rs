// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use common::Quadrant;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// (name, description, priority order, color, icon) of the fixed quadrants.
const DEFAULT_QUADRANTS: [(&str, &str, i64, &str, &str); 4] = [
    (
        "Quadrant 1: Urgent & Important",
        "Tasks that need immediate attention. Crises, deadlines, problems.",
        1,
        "#FF6B6B",
        "urgency",
    ),
    (
        "Quadrant 2: Important, Not Urgent",
        "Strategic work for long-term growth. Planning, learning, relationships.",
        2,
        "#4ECDC4",
        "strategy",
    ),
    (
        "Quadrant 3: Urgent, Not Important",
        "Distractions. Some calls, meetings and minor errands.",
        3,
        "#45B7D1",
        "distraction",
    ),
    (
        "Quadrant 4: Neither Urgent nor Important",
        "Time wasters. Social feeds, aimless browsing, trivia.",
        4,
        "#96CEB4",
        "waste",
    ),
];

/// Outcome of a quadrant deletion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadrantDeletion {
    Deleted,
    NotFound,
    /// Refused: tasks still reference the quadrant.
    InUse { tasks: i64 },
}

/// Inserts the four quadrants into an empty table. Returns the rows added.
pub async fn seed_default_quadrants(pool: &SqlitePool) -> Result<u64> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quadrants")
        .fetch_one(pool)
        .await
        .context("Failed to count quadrants")?;
    if existing > 0 {
        return Ok(0);
    }

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    for (name, description, priority_order, color_code, icon) in DEFAULT_QUADRANTS {
        sqlx::query(
            "INSERT INTO quadrants (name, description, priority_order, color_code, icon) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(description)
        .bind(priority_order)
        .bind(color_code)
        .bind(icon)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to seed quadrant '{}'", name))?;
    }
    tx.commit().await.context("Failed to commit quadrant seed")?;

    Ok(DEFAULT_QUADRANTS.len() as u64)
}

pub async fn list_quadrants(pool: &SqlitePool) -> Result<Vec<Quadrant>> {
    sqlx::query_as::<_, Quadrant>("SELECT * FROM quadrants ORDER BY priority_order ASC, id ASC")
        .fetch_all(pool)
        .await
        .context("Failed to list quadrants")
}

pub async fn get_quadrant(pool: &SqlitePool, quadrant_id: i64) -> Result<Option<Quadrant>> {
    sqlx::query_as::<_, Quadrant>("SELECT * FROM quadrants WHERE id = ?")
        .bind(quadrant_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to load quadrant with ID: {}", quadrant_id))
}

/// Changes the presentation fields staff may edit. Returns false if no such quadrant.
pub async fn update_quadrant_display(
    pool: &SqlitePool,
    quadrant_id: i64,
    priority_order: i64,
    color_code: &str,
) -> Result<bool> {
    let result = sqlx::query("UPDATE quadrants SET priority_order = ?, color_code = ? WHERE id = ?")
        .bind(priority_order)
        .bind(color_code)
        .bind(quadrant_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update quadrant with ID: {}", quadrant_id))?;

    info!(
        "Quadrant {} now has order {} and color {}",
        quadrant_id, priority_order, color_code
    );
    Ok(result.rows_affected() > 0)
}

/// Deletes a quadrant unless a task still points at it.
///
/// The foreign key is `ON DELETE RESTRICT` as well; the explicit count lets
/// callers report how many tasks block the deletion.
pub async fn delete_quadrant_in_db(pool: &SqlitePool, quadrant_id: i64) -> Result<QuadrantDeletion> {
    let referencing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE quadrant_id = ?")
        .bind(quadrant_id)
        .fetch_one(pool)
        .await
        .context("Failed to count tasks in quadrant")?;
    if referencing > 0 {
        warn!(
            "Refusing to delete quadrant {}: {} tasks reference it",
            quadrant_id, referencing
        );
        return Ok(QuadrantDeletion::InUse { tasks: referencing });
    }

    let result = sqlx::query("DELETE FROM quadrants WHERE id = ?")
        .bind(quadrant_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete quadrant with ID: {}", quadrant_id))?;

    if result.rows_affected() > 0 {
        Ok(QuadrantDeletion::Deleted)
    } else {
        Ok(QuadrantDeletion::NotFound)
    }
}
