use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::editor::validation::DEFAULT_PHOTO_MAX_BYTES;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    /// Base of public photo URLs; defaults to the S3 endpoint.
    pub s3_public_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub validation_debounce: Duration,
    pub autosave_debounce: Duration,
    pub photo_max_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3_endpoint = require_env("S3_ENDPOINT")?;
        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_public_url: std::env::var("S3_PUBLIC_URL").unwrap_or_else(|_| s3_endpoint.clone()),
            s3_endpoint,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: optional_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            validation_debounce: Duration::from_millis(optional_env("VALIDATION_DEBOUNCE_MS", 300)?),
            autosave_debounce: Duration::from_millis(optional_env("AUTOSAVE_DEBOUNCE_MS", 1500)?),
            photo_max_bytes: optional_env("PHOTO_MAX_BYTES", DEFAULT_PHOTO_MAX_BYTES)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
