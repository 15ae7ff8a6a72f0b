//! Audit trail for moderation actions.
//!
//! Append-only. Writes are best-effort: a failed audit insert is logged and
//! never fails the action it describes.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::warn;

use crate::common::{AuditEntryId, PostId};

/// One recorded moderation action.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub actor: String,
    pub action: String,
    pub post_id: Option<PostId>,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Most recent entries, newest first
    pub async fn list_recent(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            "SELECT * FROM audit_log ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(entries)
    }

    async fn insert(
        actor: &str,
        action: &str,
        post_id: Option<PostId>,
        detail: Option<&str>,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO audit_log (id, actor, action, post_id, detail)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(AuditEntryId::new())
        .bind(actor)
        .bind(action)
        .bind(post_id)
        .bind(detail)
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// Record a moderation action. Never fails the caller.
pub async fn record(
    actor: &str,
    action: &str,
    post_id: Option<PostId>,
    detail: Option<&str>,
    pool: &PgPool,
) {
    if let Err(e) = AuditEntry::insert(actor, action, post_id, detail, pool).await {
        warn!(actor = actor, action = action, error = %e, "Failed to write audit entry");
    }
}
