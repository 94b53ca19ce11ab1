use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::ServiceError;

/// Bearer token issued by `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    /// RFC3339 UTC.
    pub expires_at: String,
}

/// The operator's session against one backend.
///
/// Passed explicitly to every service call; nothing reads it from global state.
/// Transitions: `establish` on successful login, `clear` on logout. Callers hand
/// failed results to `expire_on`, which clears the token once the backend answers 401.
/// Service calls take the session by shared reference and never clear it themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    base_url: String,
    token: Option<AccessToken>,
}

impl Session {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.api_base_url().to_string(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    pub fn establish(&mut self, token: AccessToken) {
        self.token = Some(token);
    }

    pub fn clear(&mut self) -> Option<AccessToken> {
        self.token.take()
    }

    /// Drops the token when the backend no longer accepts it. Returns `true` if it did.
    pub fn expire_on(&mut self, err: &ServiceError) -> bool {
        if *err == ServiceError::Unauthorized && self.token.is_some() {
            self.token = None;
            return true;
        }
        false
    }

    /// `Authorization` header value, when logged in.
    pub fn authorization(&self) -> Option<String> {
        self.token
            .as_ref()
            .map(|t| format!("Bearer {}", t.access_token))
    }
}
