// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use common::ProductivityStats;
use sqlx::SqlitePool;
use sqlx::types::Json;
use tracing::{debug, info};

/// Counters and scores of one day, without identity columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyStats {
    pub total_pomodoros_completed: i64,
    pub total_tasks_completed: i64,
    pub time_spent_per_quadrant: BTreeMap<String, i64>,
    pub quadrant_2_time: i64,
    pub planned_pomodoros: i64,
    pub completed_on_time_tasks: i64,
    pub focus_score: f64,
    pub productivity_score: f64,
    pub interruptions_count: i64,
}

const COLUMNS: &str = "user_id, date, total_pomodoros_completed, total_tasks_completed, \
     time_spent_per_quadrant, quadrant_2_time, planned_pomodoros, completed_on_time_tasks, \
     focus_score, productivity_score, interruptions_count";

/// Inserts the day's row. Returns `None` when the user already has one for `date`.
pub async fn insert_stats_in_db(
    pool: &SqlitePool,
    user_id: i64,
    date: NaiveDate,
    stats: &DailyStats,
) -> Result<Option<ProductivityStats>> {
    let row = sqlx::query_as::<_, ProductivityStats>(&format!(
        "INSERT INTO productivity_stats ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (user_id, date) DO NOTHING RETURNING *",
        COLUMNS
    ))
    .bind(user_id)
    .bind(date)
    .bind(stats.total_pomodoros_completed)
    .bind(stats.total_tasks_completed)
    .bind(Json(&stats.time_spent_per_quadrant))
    .bind(stats.quadrant_2_time)
    .bind(stats.planned_pomodoros)
    .bind(stats.completed_on_time_tasks)
    .bind(stats.focus_score)
    .bind(stats.productivity_score)
    .bind(stats.interruptions_count)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to insert stats of user {} for {}", user_id, date))?;

    if row.is_none() {
        debug!("Stats of user {} for {} already exist", user_id, date);
    }
    Ok(row)
}

/// Writes the day's row, replacing every counter of an existing one.
pub async fn upsert_stats_in_db(
    pool: &SqlitePool,
    user_id: i64,
    date: NaiveDate,
    stats: &DailyStats,
) -> Result<ProductivityStats> {
    let row = sqlx::query_as::<_, ProductivityStats>(&format!(
        "INSERT INTO productivity_stats ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (user_id, date) DO UPDATE SET \
             total_pomodoros_completed = excluded.total_pomodoros_completed, \
             total_tasks_completed = excluded.total_tasks_completed, \
             time_spent_per_quadrant = excluded.time_spent_per_quadrant, \
             quadrant_2_time = excluded.quadrant_2_time, \
             planned_pomodoros = excluded.planned_pomodoros, \
             completed_on_time_tasks = excluded.completed_on_time_tasks, \
             focus_score = excluded.focus_score, \
             productivity_score = excluded.productivity_score, \
             interruptions_count = excluded.interruptions_count \
         RETURNING *",
        COLUMNS
    ))
    .bind(user_id)
    .bind(date)
    .bind(stats.total_pomodoros_completed)
    .bind(stats.total_tasks_completed)
    .bind(Json(&stats.time_spent_per_quadrant))
    .bind(stats.quadrant_2_time)
    .bind(stats.planned_pomodoros)
    .bind(stats.completed_on_time_tasks)
    .bind(stats.focus_score)
    .bind(stats.productivity_score)
    .bind(stats.interruptions_count)
    .fetch_one(pool)
    .await
    .with_context(|| format!("Failed to save stats of user {} for {}", user_id, date))?;

    info!("Saved stats of user {} for {}", user_id, date);
    Ok(row)
}

/// The user's rows, oldest first. Either bound may be open.
pub async fn list_stats_for_user(
    pool: &SqlitePool,
    user_id: i64,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<ProductivityStats>> {
    sqlx::query_as::<_, ProductivityStats>(
        "SELECT * FROM productivity_stats WHERE user_id = ? \
         AND (? IS NULL OR date >= ?) AND (? IS NULL OR date <= ?) \
         ORDER BY date ASC",
    )
    .bind(user_id)
    .bind(from)
    .bind(from)
    .bind(to)
    .bind(to)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to list stats of user {}", user_id))
}

pub async fn get_stats_for_day(
    pool: &SqlitePool,
    user_id: i64,
    date: NaiveDate,
) -> Result<Option<ProductivityStats>> {
    sqlx::query_as::<_, ProductivityStats>(
        "SELECT * FROM productivity_stats WHERE user_id = ? AND date = ?",
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to load stats of user {} for {}", user_id, date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{create_test_user, setup_test_db};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn sample() -> DailyStats {
        DailyStats {
            total_pomodoros_completed: 6,
            total_tasks_completed: 2,
            time_spent_per_quadrant: BTreeMap::from([("1".to_string(), 1500), ("2".to_string(), 3000)]),
            quadrant_2_time: 3000,
            planned_pomodoros: 8,
            completed_on_time_tasks: 1,
            focus_score: 75.0,
            productivity_score: 62.5,
            interruptions_count: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_is_unique_per_user_and_day() {
        let pool = setup_test_db().await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;

        let row = insert_stats_in_db(&pool, alice.id, day(1), &sample())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.date, day(1));
        assert_eq!(row.time_spent_per_quadrant.0.get("2"), Some(&3000));

        assert!(
            insert_stats_in_db(&pool, alice.id, day(1), &DailyStats::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            insert_stats_in_db(&pool, bob.id, day(1), &sample())
                .await
                .unwrap()
                .is_some()
        );

        let kept = get_stats_for_day(&pool, alice.id, day(1)).await.unwrap().unwrap();
        assert_eq!(kept.total_pomodoros_completed, 6);
    }

    #[tokio::test]
    async fn test_upsert_replaces_counters() {
        let pool = setup_test_db().await;
        let user = create_test_user(&pool, "alice").await;

        let first = upsert_stats_in_db(&pool, user.id, day(2), &sample()).await.unwrap();
        let updated = upsert_stats_in_db(
            &pool,
            user.id,
            day(2),
            &DailyStats {
                total_pomodoros_completed: 9,
                ..sample()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.id, first.id);
        assert_eq!(updated.total_pomodoros_completed, 9);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM productivity_stats")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_list_stats_in_range() {
        let pool = setup_test_db().await;
        let user = create_test_user(&pool, "alice").await;
        for d in [5, 1, 3] {
            upsert_stats_in_db(&pool, user.id, day(d), &sample()).await.unwrap();
        }

        let all = list_stats_for_user(&pool, user.id, None, None).await.unwrap();
        let dates: Vec<NaiveDate> = all.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![day(1), day(3), day(5)]);

        let middle = list_stats_for_user(&pool, user.id, Some(day(2)), Some(day(4)))
            .await
            .unwrap();
        assert_eq!(middle.len(), 1);
        assert_eq!(middle[0].date, day(3));

        let since = list_stats_for_user(&pool, user.id, Some(day(3)), None).await.unwrap();
        assert_eq!(since.len(), 2);
    }
}
