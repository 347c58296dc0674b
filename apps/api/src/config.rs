use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::embedding_client::DEFAULT_MODEL;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub embedding_api_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    /// Cleaned resume texts (`*.txt`) indexed as `resume`.
    pub resumes_dir: PathBuf,
    /// Interview notes (`*.txt`) indexed as `note`.
    pub notes_dir: PathBuf,
    /// Uploaded PDF/DOCX originals served by `/resume/:filename`.
    pub original_resumes_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            embedding_api_url: require_env("EMBEDDING_API_URL")?,
            embedding_api_key: std::env::var("EMBEDDING_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            embedding_model: env_or("EMBEDDING_MODEL", DEFAULT_MODEL),
            resumes_dir: env_or("RESUMES_DIR", "cleaned_resumes").into(),
            notes_dir: env_or("NOTES_DIR", "interview_notes").into(),
            original_resumes_dir: env_or("ORIGINAL_RESUMES_DIR", "resumes").into(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
