use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::SubmitterId;

/// Submitter - an anonymous identity bucket, not a user account.
///
/// Tracked so repeat submitters can be counted and, when necessary, blocked.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Submitter {
    pub id: SubmitterId,
    pub blocked: bool,
    pub block_action: Option<String>, // 'REJECT', 'FLAG'
    pub block_reason: Option<String>,
    pub blocked_at: Option<DateTime<Utc>>,
    pub blocked_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What happens to a blocked submitter's future submissions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockAction {
    /// Submissions are created straight into REJECTED.
    Reject,
    /// Submissions enter the queue but flagged for attention.
    Flag,
}

impl std::fmt::Display for BlockAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockAction::Reject => write!(f, "REJECT"),
            BlockAction::Flag => write!(f, "FLAG"),
        }
    }
}

impl std::str::FromStr for BlockAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "REJECT" => Ok(BlockAction::Reject),
            "FLAG" => Ok(BlockAction::Flag),
            _ => Err(anyhow::anyhow!("Invalid block action: {}", s)),
        }
    }
}

impl Submitter {
    /// Parse the stored block action.
    pub fn block_action(&self) -> Option<BlockAction> {
        self.block_action.as_deref().and_then(|s| s.parse().ok())
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Submitter {
    /// Find submitter by ID
    pub async fn find_by_id(id: SubmitterId, pool: &PgPool) -> Result<Option<Self>> {
        let submitter = sqlx::query_as::<_, Submitter>("SELECT * FROM submitters WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(submitter)
    }

    /// Find an existing submitter or create a fresh one.
    ///
    /// Called with the cookie-supplied id when present; an unknown id gets a
    /// row so blocking state can attach to it later.
    pub async fn find_or_create(id: Option<SubmitterId>, pool: &PgPool) -> Result<Self> {
        if let Some(id) = id {
            if let Some(existing) = Self::find_by_id(id, pool).await? {
                return Ok(existing);
            }
        }

        let submitter = sqlx::query_as::<_, Submitter>(
            "INSERT INTO submitters (id) VALUES ($1) RETURNING *",
        )
        .bind(id.unwrap_or_else(SubmitterId::new))
        .fetch_one(pool)
        .await?;
        Ok(submitter)
    }

    /// Block a submitter with the given action and reason
    pub async fn block(
        id: SubmitterId,
        action: BlockAction,
        reason: Option<&str>,
        blocked_by: &str,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE submitters
             SET blocked = TRUE, block_action = $2, block_reason = $3,
                 blocked_at = NOW(), blocked_by = $4
             WHERE id = $1",
        )
        .bind(id)
        .bind(action.to_string())
        .bind(reason)
        .bind(blocked_by)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Unblock a submitter, clearing all block metadata
    pub async fn unblock(id: SubmitterId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE submitters
             SET blocked = FALSE, block_action = NULL, block_reason = NULL,
                 blocked_at = NULL, blocked_by = NULL
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_action_roundtrip() {
        for action in [BlockAction::Reject, BlockAction::Flag] {
            let parsed: BlockAction = action.to_string().parse().unwrap();
            assert_eq!(parsed, action);
        }
        assert!("BANHAMMER".parse::<BlockAction>().is_err());
    }
}
