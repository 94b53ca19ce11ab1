//! REST backend for the incident triage panel: login gate, incident routes and
//! local attachment storage over the `triage_core` SQLite schema.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use rusqlite::Connection;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use triage_core::attachments::{AttachmentStore, PUBLIC_PREFIX};
use triage_core::demo::seed_demo_dataset;
use triage_core::error::AppError;
use triage_core::{db, repo};

use crate::auth::SessionStore;
use crate::config::AppConfig;

/// Room for multipart framing and the text fields on top of the file parts.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;
/// An incident carries at most an image and a video.
const MAX_FILE_PARTS: usize = 2;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub sessions: SessionStore,
    pub attachments: Arc<AttachmentStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Open (and migrate) the database, optionally seed the demo incidents, and make
    /// sure the uploads directory exists.
    pub fn open(config: AppConfig) -> Result<Self, AppError> {
        let mut conn = db::open_and_migrate(&config.database_path)?;
        if config.seed_demo && repo::count_incidents(&conn)? == 0 {
            let seeded = seed_demo_dataset(&mut conn)?;
            info!(count = seeded.len(), "seeded demo incidents");
        }

        let attachments = AttachmentStore::new(config.upload_dir.clone(), config.max_upload_bytes);
        attachments.ensure_dirs()?;

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            sessions: SessionStore::default(),
            attachments: Arc::new(attachments),
            config: Arc::new(config),
        })
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(MAX_FILE_PARTS)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let uploads = ServeDir::new(state.attachments.root());
    let cors = cors_layer(&state.config);

    let protected = Router::new()
        .route("/incidents", get(api::list_incidents).post(api::create_incident))
        .route(
            "/incidents/:id",
            get(api::get_incident).patch(api::update_incident),
        )
        .route("/auth/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_operator,
        ));

    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health))
        .route("/build", get(api::build_info))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .nest_service(PUBLIC_PREFIX, uploads)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
