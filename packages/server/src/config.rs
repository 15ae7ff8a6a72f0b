use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Missing key disables AI pre-screening rather than failing startup.
    pub openrouter_api_key: Option<String>,
    /// Public site URL, sent to OpenRouter as the HTTP-Referer.
    pub site_url: Option<String>,
    pub super_admin_user: String,
    /// Missing password disables the super admin account entirely.
    pub super_admin_pass: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            openrouter_api_key: env::var("OPENROUTER_API_KEY").ok(),
            site_url: env::var("SITE_URL").ok(),
            super_admin_user: env::var("SUPER_ADMIN_USER")
                .unwrap_or_else(|_| "super".to_string()),
            super_admin_pass: env::var("SUPER_ADMIN_PASS").ok(),
        })
    }
}
