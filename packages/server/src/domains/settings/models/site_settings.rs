use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Models offered in the super admin LLM settings screen.
pub const AVAILABLE_MODELS: &[&str] = &[
    "anthropic/claude-3.5-haiku",
    "anthropic/claude-sonnet-4",
    "openai/gpt-4o-mini",
    "openai/gpt-4o",
    "google/gemini-2.0-flash-001",
    "meta-llama/llama-3.3-70b-instruct",
];

pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-haiku";

/// SiteSettings - singleton configuration row (id = 'default').
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SiteSettings {
    pub id: String,
    pub board_name: String,
    pub tagline: Option<String>,
    pub about_text: Option<String>,
    pub analysis_model: String,
    pub rewrite_model: String,
    /// Optional custom directive for rewrite prompts.
    pub rewrite_prompt: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl SiteSettings {
    /// Load the settings singleton, creating the default row if absent.
    pub async fn load(pool: &PgPool) -> Result<Self> {
        let settings = sqlx::query_as::<_, SiteSettings>(
            "INSERT INTO site_settings (id, board_name, analysis_model, rewrite_model)
             VALUES ('default', 'Community Board', $1, $1)
             ON CONFLICT (id) DO UPDATE SET id = site_settings.id
             RETURNING *",
        )
        .bind(DEFAULT_MODEL)
        .fetch_one(pool)
        .await?;
        Ok(settings)
    }

    /// Update the public site text
    pub async fn update_site(
        board_name: &str,
        tagline: Option<&str>,
        about_text: Option<&str>,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE site_settings
             SET board_name = $1, tagline = $2, about_text = $3, updated_at = NOW()
             WHERE id = 'default'",
        )
        .bind(board_name)
        .bind(tagline)
        .bind(about_text)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update LLM configuration. Model ids are validated against the
    /// offered list so a typo cannot silently break analysis.
    pub async fn update_llm(
        analysis_model: &str,
        rewrite_model: &str,
        rewrite_prompt: Option<&str>,
        pool: &PgPool,
    ) -> Result<bool> {
        for model in [analysis_model, rewrite_model] {
            if !AVAILABLE_MODELS.contains(&model) {
                return Err(anyhow::anyhow!("Unknown model: {}", model));
            }
        }

        let result = sqlx::query(
            "UPDATE site_settings
             SET analysis_model = $1, rewrite_model = $2, rewrite_prompt = $3,
                 updated_at = NOW()
             WHERE id = 'default'",
        )
        .bind(analysis_model)
        .bind(rewrite_model)
        .bind(rewrite_prompt)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
