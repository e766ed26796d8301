// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
struct ResetToken {
    user_id: i64,
    created_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

impl ResetToken {
    fn is_usable(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now - self.created_at <= ttl
    }
}

/// Issues a single-use token for the user and returns it.
pub async fn create_reset_token(pool: &SqlitePool, user_id: i64) -> Result<String> {
    let token = Uuid::new_v4().simple().to_string();
    sqlx::query("INSERT INTO password_reset_tokens (token, user_id, created_at, used_at) VALUES (?, ?, ?, NULL)")
        .bind(&token)
        .bind(user_id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .with_context(|| format!("Failed to store reset token for user ID: {}", user_id))?;

    debug!("Issued reset token for user {}", user_id);
    Ok(token)
}

/// The user a token belongs to, if it is unused and younger than `ttl`.
pub async fn find_valid_reset_token(
    pool: &SqlitePool,
    token: &str,
    ttl: Duration,
) -> Result<Option<i64>> {
    let row = sqlx::query_as::<_, ResetToken>(
        "SELECT user_id, created_at, used_at FROM password_reset_tokens WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await
    .context("Failed to look up reset token")?;

    let now = Utc::now();
    Ok(row.filter(|t| t.is_usable(ttl, now)).map(|t| t.user_id))
}

/// Spends the token and stores the new password hash atomically.
///
/// Returns the user ID, or `None` when the token is unknown, used or expired.
/// Marking the token is the first write of the transaction, so two
/// concurrent resets with one token serialize and only one succeeds.
pub async fn consume_reset_token(
    pool: &SqlitePool,
    token: &str,
    ttl: Duration,
    password_hash: &str,
) -> Result<Option<i64>> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let now = Utc::now();

    let user_id: Option<i64> = sqlx::query_scalar(
        "UPDATE password_reset_tokens SET used_at = ? \
         WHERE token = ? AND used_at IS NULL AND julianday(created_at) >= julianday(?) \
         RETURNING user_id",
    )
    .bind(now)
    .bind(token)
    .bind(now - ttl)
    .fetch_optional(&mut *tx)
    .await
    .context("Failed to mark reset token used")?;

    let Some(user_id) = user_id else {
        tx.rollback().await.context("Failed to roll back password reset")?;
        return Ok(None);
    };

    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(password_hash)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to update password of user ID: {}", user_id))?;

    tx.commit().await.context("Failed to commit password reset")?;

    info!("Password of user {} reset", user_id);
    Ok(Some(user_id))
}

/// Drops used tokens and tokens older than `ttl`.
pub async fn purge_stale_reset_tokens(pool: &SqlitePool, ttl: Duration) -> Result<u64> {
    let cutoff = Utc::now() - ttl;
    let result = sqlx::query(
        "DELETE FROM password_reset_tokens WHERE used_at IS NOT NULL OR julianday(created_at) < julianday(?)",
    )
    .bind(cutoff)
    .execute(pool)
    .await
    .context("Failed to purge reset tokens")?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{create_test_user, setup_test_db};
    use crate::database::users::get_user_by_id;

    #[tokio::test]
    async fn test_token_is_single_use() {
        let pool = setup_test_db().await;
        let user = create_test_user(&pool, "alice").await;
        let ttl = Duration::hours(24);

        let token = create_reset_token(&pool, user.id).await.unwrap();
        assert_eq!(find_valid_reset_token(&pool, &token, ttl).await.unwrap(), Some(user.id));

        let consumed = consume_reset_token(&pool, &token, ttl, "new-hash").await.unwrap();
        assert_eq!(consumed, Some(user.id));
        let reloaded = get_user_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "new-hash");

        assert_eq!(find_valid_reset_token(&pool, &token, ttl).await.unwrap(), None);
        assert_eq!(
            consume_reset_token(&pool, &token, ttl, "other-hash").await.unwrap(),
            None
        );
        let reloaded = get_user_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "new-hash");
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected_and_purged() {
        let pool = setup_test_db().await;
        let user = create_test_user(&pool, "alice").await;
        let token = create_reset_token(&pool, user.id).await.unwrap();
        sqlx::query("UPDATE password_reset_tokens SET created_at = ?")
            .bind(Utc::now() - Duration::hours(30))
            .execute(&pool)
            .await
            .unwrap();

        let ttl = Duration::hours(24);
        assert_eq!(find_valid_reset_token(&pool, &token, ttl).await.unwrap(), None);
        assert_eq!(consume_reset_token(&pool, &token, ttl, "x").await.unwrap(), None);

        let fresh = create_reset_token(&pool, user.id).await.unwrap();
        assert_eq!(purge_stale_reset_tokens(&pool, ttl).await.unwrap(), 1);
        assert_eq!(find_valid_reset_token(&pool, &fresh, ttl).await.unwrap(), Some(user.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_resets_spend_token_once() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("reset.db").display());
        let pool = crate::database::establish_connection_pool(&url).await.unwrap();
        let user = create_test_user(&pool, "alice").await;
        let ttl = Duration::hours(24);

        for _ in 0..10 {
            let token = create_reset_token(&pool, user.id).await.unwrap();
            let (first, second) = tokio::join!(
                consume_reset_token(&pool, &token, ttl, "first-hash"),
                consume_reset_token(&pool, &token, ttl, "second-hash"),
            );
            let (first, second) = (first.unwrap(), second.unwrap());
            assert!(
                first.is_some() != second.is_some(),
                "token spent {:?}/{:?}",
                first,
                second
            );

            let expected = if first.is_some() { "first-hash" } else { "second-hash" };
            let reloaded = get_user_by_id(&pool, user.id).await.unwrap().unwrap();
            assert_eq!(reloaded.password_hash, expected);
        }
        pool.close().await;
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let pool = setup_test_db().await;
        assert_eq!(
            find_valid_reset_token(&pool, "missing", Duration::hours(1)).await.unwrap(),
            None
        );
    }
}
