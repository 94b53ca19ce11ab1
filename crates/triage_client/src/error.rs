use thiserror::Error;
use triage_core::error::AppError;

/// Failures surfaced by the incident service. Nothing is retried or swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The request never reached the server.
    #[error("network: {0}")]
    Network(String),

    /// 5xx, or a status outside the 4xx/5xx ranges.
    #[error("server error: status {code}")]
    Server { code: u16 },

    /// The backend rejected the request (any 4xx other than 401/403/404) and said why.
    #[error("validation: {message}")]
    Validation { message: String },

    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    /// 2xx with a body that does not decode.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Map a non-2xx status and its body onto the taxonomy.
    pub fn from_status(code: u16, body: &str) -> Self {
        match code {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            400..=499 => Self::Validation {
                message: rejection_reason(body),
            },
            _ => Self::Server { code },
        }
    }

    /// Text for the error banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "The incidents API is unreachable. Check your connection and try again.".to_string(),
            Self::Server { code } => format!("The incidents API failed (HTTP {code})."),
            Self::Validation { message } => format!("The change was rejected: {message}"),
            Self::NotFound => "The incident no longer exists.".to_string(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Self::InvalidResponse(_) => "The incidents API returned an unreadable response.".to_string(),
        }
    }
}

/// Prefer the backend's structured error; fall back to the raw body.
fn rejection_reason(body: &str) -> String {
    match serde_json::from_str::<AppError>(body) {
        Ok(err) => match err.details {
            Some(details) => format!("{} ({details})", err.message),
            None => err.message,
        },
        Err(_) if body.trim().is_empty() => "request rejected".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
