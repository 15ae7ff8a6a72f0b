use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{ModeratorId, PostId, RewriteLogId};

/// RewriteLog - append-only record of one AI rewrite use.
///
/// Exists only to compute rate-limit windows; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RewriteLog {
    pub id: RewriteLogId,
    pub moderator_id: ModeratorId,
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
}

impl RewriteLog {
    /// Count a moderator's rewrites inside the sliding 60-minute window.
    pub async fn count_recent(
        moderator_id: ModeratorId,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<i64> {
        let window_start = now - Duration::minutes(60);
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM rewrite_logs
             WHERE moderator_id = $1 AND created_at > $2",
        )
        .bind(moderator_id)
        .bind(window_start)
        .fetch_one(pool)
        .await?;
        Ok(count.0)
    }

    /// Record a rewrite and bump the post's counter in one transaction.
    ///
    /// Partial application (log without counter, or counter without log)
    /// would corrupt the rate accounting, so both writes commit together.
    pub async fn record_and_increment(
        moderator_id: ModeratorId,
        post_id: PostId,
        pool: &PgPool,
    ) -> Result<()> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO rewrite_logs (id, moderator_id, post_id) VALUES ($1, $2, $3)",
        )
        .bind(RewriteLogId::new())
        .bind(moderator_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE posts SET rewrite_count = rewrite_count + 1 WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
