use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use triage_core::error::{AppError, NOT_FOUND, UNAUTHORIZED, UPLOAD_TOO_LARGE, VALIDATION_FAILED};

/// `AppError` on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

pub fn status_for(code: &str) -> StatusCode {
    match code {
        NOT_FOUND => StatusCode::NOT_FOUND,
        VALIDATION_FAILED => StatusCode::BAD_REQUEST,
        UNAUTHORIZED => StatusCode::UNAUTHORIZED,
        UPLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0.code);
        if status.is_server_error() {
            tracing::error!(code = %self.0.code, message = %self.0.message, details = ?self.0.details, "request failed");
        }
        let mut response = (status, Json(self.0)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
        }
        response
    }
}
