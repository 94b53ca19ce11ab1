use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use triage_core::domain::{Incident, IncidentPatch, IncidentStatus, NewIncident};
use triage_core::error::{AppError, UPLOAD_TOO_LARGE};
use triage_core::filter::{filter_incidents, Criteria, FilterValue};
use triage_core::repo;
use triage_core::validate::{validate_new_incident, validate_patch};

use crate::auth::Operator;
use crate::error::ApiError;
use crate::AppState;

pub const SERVICE_NAME: &str = "Incident Triage API";

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn build_info() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "commit": option_env!("GIT_COMMIT_HASH"),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub project: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl ListParams {
    pub fn criteria(&self) -> Result<Criteria, AppError> {
        let status = match FilterValue::parse(self.status.as_deref()) {
            FilterValue::All => FilterValue::All,
            FilterValue::Exact(raw) => FilterValue::Exact(raw.parse::<IncidentStatus>()?),
        };
        Ok(Criteria {
            project: FilterValue::parse(self.project.as_deref()),
            category: FilterValue::parse(self.category.as_deref()),
            status,
            search: self.search.clone().unwrap_or_default(),
        })
    }
}

fn bad_path(rejection: PathRejection) -> ApiError {
    AppError::validation("Invalid incident id")
        .with_details(rejection.body_text())
        .into()
}

pub async fn list_incidents(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Incident>>, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        AppError::validation("Invalid query parameters").with_details(rejection.body_text())
    })?;
    let criteria = params.criteria()?;

    let all = {
        let conn = state.db.lock().await;
        repo::list_incidents(&conn)?
    };
    let page: Vec<Incident> = filter_incidents(&all, &criteria)
        .into_iter()
        .skip(params.skip.unwrap_or(0))
        .take(params.limit.unwrap_or(usize::MAX))
        .collect();
    debug!(total = all.len(), returned = page.len(), "listed incidents");
    Ok(Json(page))
}

pub async fn get_incident(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Incident>, ApiError> {
    let Path(id) = id.map_err(bad_path)?;
    let conn = state.db.lock().await;
    Ok(Json(repo::get_incident(&conn, id)?))
}

pub async fn update_incident(
    State(state): State<AppState>,
    Extension(operator): Extension<Operator>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<IncidentPatch>, JsonRejection>,
) -> Result<Json<Incident>, ApiError> {
    let Path(id) = id.map_err(bad_path)?;
    let Json(patch) = payload.map_err(|rejection| {
        AppError::validation("Invalid update body").with_details(rejection.body_text())
    })?;
    validate_patch(&patch)?;

    let updated = {
        let mut conn = state.db.lock().await;
        repo::update_incident(&mut conn, id, &patch)?
    };
    info!(
        id,
        operator = %operator.username,
        status = %updated.status,
        comments_changed = patch.comments.is_some(),
        "incident updated"
    );
    Ok(Json(updated))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::new(UPLOAD_TOO_LARGE, "Request body too large").with_details(err.body_text())
    } else {
        AppError::validation("Malformed multipart body").with_details(err.body_text())
    }
}

async fn text(field: Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(multipart_error)
}

/// Client file name and contents of one file part.
type Upload = (Option<String>, Bytes);

/// An empty file part counts as no file.
async fn upload(field: Field<'_>) -> Result<Option<Upload>, AppError> {
    let file_name = field.file_name().map(str::to_string);
    let bytes = field.bytes().await.map_err(multipart_error)?;
    Ok((!bytes.is_empty()).then_some((file_name, bytes)))
}

/// Multipart intake used by reporting applications. The optional `image` and `video`
/// parts are stored locally and their public URLs recorded on the incident.
pub async fn create_incident(
    State(state): State<AppState>,
    Extension(operator): Extension<Operator>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Incident>), ApiError> {
    let mut input = NewIncident::default();
    let mut image: Option<Upload> = None;
    let mut video: Option<Upload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "project" => input.project = text(field).await?,
            "category" => input.category = text(field).await?,
            "description" => input.description = text(field).await?,
            "fullDescription" | "full_description" => input.full_description = text(field).await?,
            "status" => {
                let raw = text(field).await?;
                if !raw.trim().is_empty() {
                    input.status = raw.trim().parse()?;
                }
            }
            "date" => {
                let raw = text(field).await?;
                input.date = Some(raw).filter(|d| !d.trim().is_empty());
            }
            "image" => image = upload(field).await?,
            "video" => video = upload(field).await?,
            other => debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    // Reject bad records before anything touches the uploads directory.
    let mut input = validate_new_incident(&input)?;
    if let Some((file_name, bytes)) = image {
        input.image = Some(state.attachments.put(file_name.as_deref(), &bytes)?.url);
    }
    if let Some((file_name, bytes)) = video {
        input.video = Some(state.attachments.put(file_name.as_deref(), &bytes)?.url);
    }

    let incident = {
        let mut conn = state.db.lock().await;
        repo::insert_incident(&mut conn, &input)?
    };
    info!(
        id = incident.id,
        project = %incident.project,
        operator = %operator.username,
        has_image = incident.image.is_some(),
        has_video = incident.video.is_some(),
        "incident created"
    );
    Ok((StatusCode::CREATED, Json(incident)))
}
