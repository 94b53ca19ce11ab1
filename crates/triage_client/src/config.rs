use triage_core::error::AppError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Connection settings for the panel. Read once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_base_url: String,
    username: String,
    password: String,
}

impl ClientConfig {
    pub fn new(
        api_base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, AppError> {
        let api_base_url = api_base_url.trim().trim_end_matches('/').to_string();
        let scheme_ok = api_base_url.starts_with("http://") || api_base_url.starts_with("https://");
        let has_host = api_base_url
            .split_once("://")
            .map(|(_, rest)| !rest.is_empty())
            .unwrap_or(false);
        if !scheme_ok || !has_host {
            return Err(AppError::new(
                "CONFIG_INVALID_API_URL",
                "API base URL must be an http(s) URL",
            )
            .with_details(format!("api_base_url={api_base_url}")));
        }

        Ok(Self {
            api_base_url,
            username: username.into(),
            password: password.into(),
        })
    }

    /// `TRIAGE_API_URL`, `TRIAGE_ADMIN_USERNAME`, `TRIAGE_ADMIN_PASSWORD`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let url = lookup("TRIAGE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let username = lookup("TRIAGE_ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string());
        let password = lookup("TRIAGE_ADMIN_PASSWORD").ok_or_else(|| {
            AppError::new(
                "CONFIG_MISSING_PASSWORD",
                "TRIAGE_ADMIN_PASSWORD must be set",
            )
        })?;
        Self::new(&url, username, password)
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}
