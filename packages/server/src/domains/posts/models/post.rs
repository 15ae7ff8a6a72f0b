use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use typed_builder::TypedBuilder;

use crate::common::{PostId, SubmitterId};
use crate::domains::posts::ai_assist::AnalysisResult;
use crate::domains::posts::machines::{ApprovalFields, HistorySnapshot, Section, Status};

/// Post - a tip or notice on the community board
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: PostId,
    pub submitter_id: Option<SubmitterId>,

    // Content
    pub title: String,
    pub description: String,

    // Location (free text plus optional structured pair)
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,

    // Classification
    pub section: String, // 'ALERT', 'HAPPENINGS', 'LOST_FOUND', 'NEIGHBORS', 'BOARD_NOTES'
    pub status: String,  // 'PENDING', 'LIVE', 'REJECTED', 'EXPIRED', 'DELETED'
    pub event_date: Option<DateTime<Utc>>,

    // Moderation metadata
    pub pinned: bool,
    pub urgent: bool,
    pub mod_note: Option<String>,
    /// True for board notes and other moderator-authored posts.
    pub mod_post: bool,
    pub ai_analysis: Option<Json<AnalysisResult>>,
    pub rewrite_count: i32,

    // Edit history (bounded undo stack)
    pub desc_history: Json<Vec<HistorySnapshot>>,

    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub edited_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Parse the stored section string.
    pub fn section(&self) -> Result<Section> {
        self.section.parse()
    }

    /// Parse the stored status string.
    pub fn status(&self) -> Result<Status> {
        self.status.parse()
    }
}

/// Fields for creating a new post
#[derive(Debug, Clone, TypedBuilder)]
pub struct CreatePost {
    pub title: String,
    pub description: String,
    pub section: Section,
    #[builder(default)]
    pub status: Option<Status>,
    #[builder(default)]
    pub submitter_id: Option<SubmitterId>,
    #[builder(default)]
    pub location: Option<String>,
    #[builder(default)]
    pub latitude: Option<f64>,
    #[builder(default)]
    pub longitude: Option<f64>,
    #[builder(default)]
    pub location_name: Option<String>,
    #[builder(default)]
    pub event_date: Option<DateTime<Utc>>,
    #[builder(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[builder(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[builder(default = false)]
    pub mod_post: bool,
}

/// Content replacement applied by an edit action (validated upstream).
#[derive(Debug, Clone)]
pub struct EditContent {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    /// `None` leaves the section unchanged.
    pub section: Option<Section>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Post {
    /// Find post by ID
    pub async fn find_by_id(id: PostId, pool: &PgPool) -> Result<Option<Self>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(post)
    }

    /// Insert a new post and return it
    pub async fn create(input: CreatePost, pool: &PgPool) -> Result<Self> {
        let status = input.status.unwrap_or(Status::Pending);
        let post = sqlx::query_as::<_, Post>(
            "INSERT INTO posts
                (id, submitter_id, title, description, location, latitude, longitude,
                 location_name, section, status, event_date, expires_at, approved_at, mod_post)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING *",
        )
        .bind(PostId::new())
        .bind(input.submitter_id)
        .bind(input.title)
        .bind(input.description)
        .bind(input.location)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.location_name)
        .bind(input.section.to_string())
        .bind(status.to_string())
        .bind(input.event_date)
        .bind(input.expires_at)
        .bind(input.approved_at)
        .bind(input.mod_post)
        .fetch_one(pool)
        .await?;
        Ok(post)
    }

    /// The moderation queue: pending posts, oldest first
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<Self>> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE status = 'PENDING' ORDER BY created_at ASC",
        )
        .fetch_all(pool)
        .await?;
        Ok(posts)
    }

    /// Live posts for the public board, pinned first then newest approvals
    pub async fn list_live(pool: &PgPool) -> Result<Vec<Self>> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts
             WHERE status = 'LIVE'
             ORDER BY pinned DESC, approved_at DESC NULLS LAST",
        )
        .fetch_all(pool)
        .await?;
        Ok(posts)
    }

    /// Archived posts (rejected, expired, deleted), newest first
    pub async fn list_archive(pool: &PgPool) -> Result<Vec<Self>> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts
             WHERE status IN ('REJECTED', 'EXPIRED', 'DELETED')
             ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await?;
        Ok(posts)
    }

    /// Approve a pending post. The status guard makes concurrent approvals
    /// race-safe: exactly one conditional update wins.
    ///
    /// Returns false when the post was not PENDING (or does not exist).
    pub async fn approve(id: PostId, fields: &ApprovalFields, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE posts
             SET status = 'LIVE', section = $2, approved_at = $3, expires_at = $4
             WHERE id = $1 AND status = 'PENDING'",
        )
        .bind(id)
        .bind(fields.section.to_string())
        .bind(fields.approved_at)
        .bind(fields.expires_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Guarded status transition. Returns false when the current status was
    /// not one of `from`.
    pub async fn transition(
        id: PostId,
        from: &[Status],
        to: Status,
        pool: &PgPool,
    ) -> Result<bool> {
        let from: Vec<String> = from.iter().map(|s| s.to_string()).collect();
        let result = sqlx::query(
            "UPDATE posts SET status = $2 WHERE id = $1 AND status = ANY($3)",
        )
        .bind(id)
        .bind(to.to_string())
        .bind(&from)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply an edit: content replacement and history push in one UPDATE so
    /// a concurrent action cannot observe one without the other.
    pub async fn apply_edit(
        id: PostId,
        content: &EditContent,
        history: &[HistorySnapshot],
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE posts
             SET title = $2, description = $3, location = $4, latitude = $5,
                 longitude = $6, location_name = $7,
                 section = COALESCE($8, section),
                 desc_history = $9, edited_at = $10
             WHERE id = $1 AND status IN ('PENDING', 'LIVE')",
        )
        .bind(id)
        .bind(&content.title)
        .bind(&content.description)
        .bind(&content.location)
        .bind(content.latitude)
        .bind(content.longitude)
        .bind(&content.location_name)
        .bind(content.section.map(|s| s.to_string()))
        .bind(Json(history))
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a rewrite: title/description replacement plus history push.
    pub async fn apply_rewrite(
        id: PostId,
        title: &str,
        description: &str,
        history: &[HistorySnapshot],
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE posts
             SET title = $2, description = $3, desc_history = $4, edited_at = $5
             WHERE id = $1 AND status IN ('PENDING', 'LIVE')",
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(Json(history))
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Restore content from a popped snapshot, persisting the shrunk stack.
    pub async fn apply_undo(
        id: PostId,
        snapshot: &HistorySnapshot,
        remaining: &[HistorySnapshot],
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE posts
             SET title = $2, description = $3, desc_history = $4, edited_at = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(&snapshot.title)
        .bind(&snapshot.desc)
        .bind(Json(remaining))
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Toggle the pinned flag
    pub async fn toggle_pinned(id: PostId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET pinned = NOT pinned WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Toggle the urgent flag
    pub async fn toggle_urgent(id: PostId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET urgent = NOT urgent WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set or clear the private moderator note
    pub async fn set_mod_note(id: PostId, note: Option<&str>, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET mod_note = $2 WHERE id = $1")
            .bind(id)
            .bind(note)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Store an analysis result (advisory metadata only)
    pub async fn set_analysis(
        id: PostId,
        analysis: &AnalysisResult,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET ai_analysis = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(analysis))
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete an archived post. Guarded so a LIVE or PENDING post can
    /// never be purged directly.
    pub async fn purge(id: PostId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM posts
             WHERE id = $1 AND status IN ('REJECTED', 'EXPIRED', 'DELETED')",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lazy expiry sweep, run before every public board read.
    ///
    /// Four guarded UPDATEs mirror `machines::expiry::should_auto_expire`.
    /// Idempotent: a second run matches no rows.
    pub async fn auto_expire(now: DateTime<Utc>, pool: &PgPool) -> Result<u64> {
        let alerts = sqlx::query(
            "UPDATE posts SET status = 'EXPIRED'
             WHERE status = 'LIVE' AND section = 'ALERT'
               AND created_at + INTERVAL '7 days' < $1",
        )
        .bind(now)
        .execute(pool)
        .await?;

        let happenings = sqlx::query(
            "UPDATE posts SET status = 'EXPIRED'
             WHERE status = 'LIVE' AND section = 'HAPPENINGS'
               AND (event_date < $1 OR created_at + INTERVAL '14 days' < $1)",
        )
        .bind(now)
        .execute(pool)
        .await?;

        let defaults = sqlx::query(
            "UPDATE posts SET status = 'EXPIRED'
             WHERE status = 'LIVE' AND section IN ('LOST_FOUND', 'NEIGHBORS')
               AND created_at + INTERVAL '14 days' < $1",
        )
        .bind(now)
        .execute(pool)
        .await?;

        let notes = sqlx::query(
            "UPDATE posts SET status = 'EXPIRED'
             WHERE status = 'LIVE' AND section = 'BOARD_NOTES'
               AND expires_at IS NOT NULL AND expires_at < $1",
        )
        .bind(now)
        .execute(pool)
        .await?;

        Ok(alerts.rows_affected()
            + happenings.rows_affected()
            + defaults.rows_affected()
            + notes.rows_affected())
    }

    /// How many posts a submitter has created (any status)
    pub async fn count_by_submitter(submitter_id: SubmitterId, pool: &PgPool) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM posts WHERE submitter_id = $1")
                .bind(submitter_id)
                .fetch_one(pool)
                .await?;
        Ok(count.0)
    }
}
