use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use tracing::{info, warn};
use triage_core::error::AppError;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// The authenticated operator, attached to requests that passed `require_operator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub username: String,
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Opaque bearer tokens issued at login, each with an absolute expiry.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Operator>>>,
}

impl SessionStore {
    /// Also drops every token that has already expired.
    pub async fn issue(&self, username: &str, ttl: Duration) -> Operator {
        let now = OffsetDateTime::now_utc();
        let operator = Operator {
            username: username.to_string(),
            token: Uuid::new_v4().to_string(),
            expires_at: now + ttl,
        };
        let mut sessions = self.inner.write().await;
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(operator.token.clone(), operator.clone());
        operator
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Expired tokens are dropped on lookup.
    pub async fn get(&self, token: &str) -> Option<Operator> {
        let found = self.inner.read().await.get(token).cloned()?;
        if found.expires_at <= OffsetDateTime::now_utc() {
            self.inner.write().await.remove(token);
            return None;
        }
        Some(found)
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.inner.write().await.remove(token).is_some()
    }
}

fn same_digest(expected: &str, given: &str) -> bool {
    Sha256::digest(expected.as_bytes()) == Sha256::digest(given.as_bytes())
}

/// Both sides are hashed first so the comparison length never depends on the input.
pub fn credentials_match(
    expected_user: &str,
    expected_password: &str,
    user: &str,
    password: &str,
) -> bool {
    let user_ok = same_digest(expected_user, user);
    let password_ok = same_digest(expected_password, password);
    user_ok & password_ok
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    access_token: String,
    token_type: &'static str,
    expires_at: String,
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        AppError::validation("Invalid login body").with_details(rejection.body_text())
    })?;

    let config = &state.config;
    if !credentials_match(
        &config.admin_username,
        &config.admin_password,
        &req.username,
        &req.password,
    ) {
        warn!(username = %req.username, "rejected login");
        return Err(AppError::unauthorized("Incorrect username or password").into());
    }

    let operator = state
        .sessions
        .issue(&req.username, Duration::minutes(config.token_ttl_minutes))
        .await;
    let expires_at = operator.expires_at.format(&Rfc3339).map_err(|e| {
        AppError::new("INTERNAL_TIME_FORMAT_FAILED", "Failed to format token expiry")
            .with_details(e.to_string())
    })?;
    info!(username = %operator.username, %expires_at, "operator logged in");

    Ok(Json(LoginResponse {
        access_token: operator.token,
        token_type: "bearer",
        expires_at,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(operator): Extension<Operator>,
) -> StatusCode {
    state.sessions.revoke(&operator.token).await;
    info!(username = %operator.username, "operator logged out");
    StatusCode::NO_CONTENT
}

fn bearer(req: &Request) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

pub async fn require_operator(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer(&req) else {
        return ApiError(AppError::unauthorized("Missing bearer token")).into_response();
    };
    match state.sessions.get(&token).await {
        Some(operator) => {
            req.extensions_mut().insert(operator);
            next.run(req).await
        }
        None => ApiError(AppError::unauthorized("Invalid or expired token")).into_response(),
    }
}
