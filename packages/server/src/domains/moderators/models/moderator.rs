use anyhow::Result;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::common::ModeratorId;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-z0-9_]{3,30}$").expect("valid regex");
}

/// Moderator - an authenticated human reviewer.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Moderator {
    pub id: ModeratorId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub active: bool,

    // AI-rewrite entitlement
    pub rewrite_enabled: bool,
    pub rewrite_limit_per_post: i32,
    pub rewrite_limit_per_hour: i32,

    pub created_at: DateTime<Utc>,
}

/// Hash a password for storage or comparison.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Validate a moderator username: lowercase alphanumerics and underscores,
/// 3 to 30 characters.
pub fn validate_username(username: &str) -> Result<()> {
    if !USERNAME_RE.is_match(username) {
        return Err(anyhow::anyhow!(
            "Username must be 3-30 lowercase letters, digits or underscores"
        ));
    }
    Ok(())
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Moderator {
    /// Find moderator by ID
    pub async fn find_by_id(id: ModeratorId, pool: &PgPool) -> Result<Option<Self>> {
        let moderator =
            sqlx::query_as::<_, Moderator>("SELECT * FROM moderators WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(moderator)
    }

    /// Find an active moderator by username
    pub async fn find_active_by_username(username: &str, pool: &PgPool) -> Result<Option<Self>> {
        let moderator = sqlx::query_as::<_, Moderator>(
            "SELECT * FROM moderators WHERE username = $1 AND active = TRUE",
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;
        Ok(moderator)
    }

    /// Authenticate by username and password. Inactive accounts never match.
    pub async fn authenticate(
        username: &str,
        password: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let Some(moderator) = Self::find_active_by_username(username, pool).await? else {
            return Ok(None);
        };
        if moderator.password_hash == hash_password(password) {
            Ok(Some(moderator))
        } else {
            Ok(None)
        }
    }

    /// List all moderators, active first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>> {
        let moderators = sqlx::query_as::<_, Moderator>(
            "SELECT * FROM moderators ORDER BY active DESC, username ASC",
        )
        .fetch_all(pool)
        .await?;
        Ok(moderators)
    }

    /// Create a new moderator account
    pub async fn create(username: &str, password: &str, pool: &PgPool) -> Result<Self> {
        validate_username(username)?;
        let moderator = sqlx::query_as::<_, Moderator>(
            "INSERT INTO moderators (id, username, password_hash)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(ModeratorId::new())
        .bind(username)
        .bind(hash_password(password))
        .fetch_one(pool)
        .await?;
        Ok(moderator)
    }

    /// Reset a moderator's password
    pub async fn set_password(id: ModeratorId, password: &str, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("UPDATE moderators SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash_password(password))
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Activate or deactivate an account
    pub async fn set_active(id: ModeratorId, active: bool, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("UPDATE moderators SET active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update the AI-rewrite entitlement
    pub async fn set_rewrite_entitlement(
        id: ModeratorId,
        enabled: bool,
        limit_per_post: i32,
        limit_per_hour: i32,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE moderators
             SET rewrite_enabled = $2, rewrite_limit_per_post = $3, rewrite_limit_per_hour = $4
             WHERE id = $1",
        )
        .bind(id)
        .bind(enabled)
        .bind(limit_per_post)
        .bind(limit_per_hour)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_is_stable() {
        assert_eq!(hash_password("hunter2"), hash_password("hunter2"));
        assert_ne!(hash_password("hunter2"), hash_password("hunter3"));
        // sha256 hex digest
        assert_eq!(hash_password("hunter2").len(), 64);
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("sam_the_mod").is_ok());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("Has_Caps").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
    }
}
