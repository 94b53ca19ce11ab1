use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use triage_server::config::AppConfig;
use triage_server::{router, AppState};

const PASSWORD: &str = "correct horse";

fn app_with_limit(max_upload_bytes: usize) -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        database_path: dir.path().join("db").join("incidents.sqlite"),
        upload_dir: dir.path().join("uploads"),
        max_upload_bytes,
        admin_password: PASSWORD.to_string(),
        seed_demo: true,
        ..AppConfig::default()
    };
    let state = AppState::open(config).unwrap();
    (router(state), dir)
}

fn app() -> (Router, TempDir) {
    app_with_limit(10 * 1024 * 1024)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, req).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn login(app: &Router) -> String {
    let (status, body) = send_json(
        app,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({"username": "admin", "password": PASSWORD}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "bearer");
    body["accessToken"].as_str().unwrap().to_string()
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect()
}

/// `files` are `(part name, file name, contents)`.
fn multipart(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> (String, Vec<u8>) {
    let boundary = "triage-boundary-7MA4YWxk";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    for (name, file_name, data) in files {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

fn create_request(
    token: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Request<Body> {
    let (content_type, body) = multipart(fields, files);
    Request::builder()
        .method("POST")
        .uri("/incidents")
        .header(header::CONTENT_TYPE, content_type)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_and_service_info_are_public() {
    let (app, _dir) = app();
    let (status, body) = send_json(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));

    let (status, body) = send_json(&app, get("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let (status, body) = send_json(&app, get("/build", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("commit").is_some());
}

#[tokio::test]
async fn incident_routes_require_a_valid_token() {
    let (app, _dir) = app();
    let (status, body) = send_json(&app, get("/incidents", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send_json(&app, get("/incidents/1", Some("not-a-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let (app, _dir) = app();
    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({"username": "admin", "password": "admin123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Incorrect username or password");
}

#[tokio::test]
async fn list_is_newest_first_and_honours_query_filters() {
    let (app, _dir) = app();
    let token = login(&app).await;

    let (status, body) = send_json(&app, get("/incidents", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![6, 5, 4, 3, 2, 1]);

    let (_, body) = send_json(
        &app,
        get(
            "/incidents?project=POS%20Botiller%C3%ADa&status=pending",
            Some(&token),
        ),
    )
    .await;
    assert_eq!(ids(&body), vec![1]);

    let (_, body) = send_json(&app, get("/incidents?search=ERROR", Some(&token))).await;
    assert_eq!(ids(&body), vec![6]);

    let (_, body) = send_json(&app, get("/incidents?status=open", Some(&token))).await;
    assert_eq!(ids(&body), vec![5, 3, 1]);

    let (_, body) = send_json(&app, get("/incidents?skip=1&limit=2", Some(&token))).await;
    assert_eq!(ids(&body), vec![5, 4]);

    let (status, body) = send_json(&app, get("/incidents?status=closed", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn get_reports_missing_and_malformed_ids() {
    let (app, _dir) = app();
    let token = login(&app).await;

    let (status, body) = send_json(&app, get("/incidents/2", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Boleta no se imprime");
    assert_eq!(body["status"], "in-progress");

    let (status, body) = send_json(&app, get("/incidents/999", Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send_json(&app, get("/incidents/abc", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_updates_status_and_comments() {
    let (app, _dir) = app();
    let token = login(&app).await;

    let (status, body) = send_json(
        &app,
        json_request("PATCH", "/incidents/4", Some(&token), json!({"status": "resolved"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "resolved");
    assert!(body["resolvedAt"].is_string());
    assert_eq!(body["project"], "Car Wash Booking");

    let (status, body) = send_json(
        &app,
        json_request(
            "PATCH",
            "/incidents/4",
            Some(&token),
            json!({"internalComment": "Conciliado con el banco"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comments"], "Conciliado con el banco");
    assert_eq!(body["status"], "resolved");
}

#[tokio::test]
async fn patch_rejects_bad_bodies() {
    let (app, _dir) = app();
    let token = login(&app).await;

    let (status, body) = send_json(
        &app,
        json_request("PATCH", "/incidents/1", Some(&token), json!({"status": "closed"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, body) = send_json(
        &app,
        json_request("PATCH", "/incidents/1", Some(&token), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Update must include status or comments");

    let (status, _) = send_json(
        &app,
        json_request("PATCH", "/incidents/999", Some(&token), json!({"comments": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send_json(&app, get("/incidents/1", Some(&token))).await;
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn create_stores_image_and_serves_it() {
    let (app, _dir) = app();
    let token = login(&app).await;
    let png: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

    let (status, body) = send_json(
        &app,
        create_request(
            &token,
            &[
                ("project", "POS Botillería"),
                ("category", "Pagos"),
                ("description", "Pantalla congelada"),
                ("fullDescription", "La caja 2 no responde tras cobrar"),
                ("date", "2026-01-08T10:00:00-03:00"),
            ],
            &[("image", "captura.PNG", png)],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 7);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["date"], "2026-01-08T13:00:00Z");
    let url = body["image"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/") && url.ends_with(".png"), "{url}");

    let (status, bytes) = send(&app, get(&url, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, png.to_vec());

    assert_eq!(body["video"], Value::Null);

    let (_, body) = send_json(&app, get("/incidents", Some(&token))).await;
    assert_eq!(ids(&body)[0], 7);
}

#[tokio::test]
async fn create_stores_video_next_to_image() {
    let (app, _dir) = app();
    let token = login(&app).await;
    let jpg: &[u8] = b"\xff\xd8\xff\xe0jpeg-bytes";
    let mp4: &[u8] = b"\x00\x00\x00\x18ftypmp42video-bytes";

    let (status, body) = send_json(
        &app,
        create_request(
            &token,
            &[
                ("project", "Car Wash Booking"),
                ("category", "Reservas"),
                ("description", "Cliente grabó el error"),
            ],
            &[("image", "error.jpg", jpg), ("video", "pantalla.MP4", mp4)],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let image = body["image"].as_str().unwrap().to_string();
    let video = body["video"].as_str().unwrap().to_string();
    assert!(video.starts_with("/uploads/") && video.ends_with(".mp4"), "{video}");
    assert_ne!(image, video);

    let (status, bytes) = send(&app, get(&video, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, mp4.to_vec());

    let id = body["id"].as_i64().unwrap();
    let (_, stored) = send_json(&app, get(&format!("/incidents/{id}"), Some(&token))).await;
    assert_eq!(stored["video"], video.as_str());
}

#[tokio::test]
async fn create_rejects_oversized_image() {
    let (app, _dir) = app_with_limit(1024);
    let token = login(&app).await;
    let big = vec![7u8; 4096];

    let (status, body) = send_json(
        &app,
        create_request(
            &token,
            &[
                ("project", "Inventario Central"),
                ("category", "Acceso"),
                ("description", "Foto enorme"),
            ],
            &[("image", "foto.jpg", big.as_slice())],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "UPLOAD_TOO_LARGE");

    let (_, body) = send_json(&app, get("/incidents", Some(&token))).await;
    assert_eq!(ids(&body).len(), 6);
}

#[tokio::test]
async fn create_reports_every_missing_field() {
    let (app, _dir) = app();
    let token = login(&app).await;

    let (status, body) = send_json(
        &app,
        create_request(&token, &[("category", "Pagos"), ("status", "closed")], &[]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, body) = send_json(
        &app,
        create_request(&token, &[("category", "Pagos")], &[]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("project is required"), "{details}");
    assert!(details.contains("description is required"), "{details}");
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let (app, _dir) = app();
    let token = login(&app).await;

    let (status, _) = send(
        &app,
        json_request("POST", "/auth/logout", Some(&token), Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(&app, get("/incidents", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
