use std::path::PathBuf;
use std::{env, fs};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use triage_core::attachments::DEFAULT_MAX_BYTES;

pub const CONFIG_PATH_VAR: &str = "TRIAGE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub admin_username: String,
    pub admin_password: String,
    pub token_ttl_minutes: i64,
    /// `["*"]` or an empty list allows any origin.
    pub cors_origins: Vec<String>,
    /// Insert the demo incidents when the database starts out empty.
    pub seed_demo: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_path: PathBuf::from("data/incidents.sqlite"),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_BYTES,
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
            token_ttl_minutes: 30,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            seed_demo: false,
        }
    }
}

impl AppConfig {
    /// JSON file at `$TRIAGE_CONFIG` (default `config.json`, optional), then `TRIAGE_*`
    /// environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config.json".to_string());
        let raw = fs::read_to_string(&path).ok();
        Self::from_sources(raw.as_deref(), |key| env::var(key).ok())
            .with_context(|| format!("failed to load configuration (file {path})"))
    }

    pub fn from_sources(
        file: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let mut cfg: AppConfig = match file {
            Some(raw) => serde_json::from_str(raw).context("failed to parse config file")?,
            None => Self::default(),
        };

        if let Some(v) = lookup("TRIAGE_HOST") {
            cfg.host = v;
        }
        if let Some(v) = lookup("TRIAGE_PORT") {
            cfg.port = v.trim().parse().context("TRIAGE_PORT is not a port number")?;
        }
        if let Some(v) = lookup("TRIAGE_DATABASE_PATH") {
            cfg.database_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("TRIAGE_UPLOAD_DIR") {
            cfg.upload_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("TRIAGE_MAX_UPLOAD_BYTES") {
            cfg.max_upload_bytes = v
                .trim()
                .parse()
                .context("TRIAGE_MAX_UPLOAD_BYTES is not a byte count")?;
        }
        if let Some(v) = lookup("TRIAGE_ADMIN_USERNAME") {
            cfg.admin_username = v;
        }
        if let Some(v) = lookup("TRIAGE_ADMIN_PASSWORD") {
            cfg.admin_password = v;
        }
        if let Some(v) = lookup("TRIAGE_TOKEN_TTL_MINUTES") {
            cfg.token_ttl_minutes = v
                .trim()
                .parse()
                .context("TRIAGE_TOKEN_TTL_MINUTES is not a number")?;
        }
        if let Some(v) = lookup("TRIAGE_CORS_ORIGINS") {
            cfg.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = lookup("TRIAGE_SEED_DEMO") {
            cfg.seed_demo = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        anyhow::ensure!(cfg.token_ttl_minutes > 0, "token TTL must be positive");
        anyhow::ensure!(!cfg.admin_username.trim().is_empty(), "admin username is empty");
        Ok(cfg)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}
