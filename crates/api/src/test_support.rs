//! Helpers for route tests: an in-memory database and JSON requests.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use qrpulse_core::session::{KnownSessionCache, SessionRegister};
use qrpulse_db::SeaOrmClaimStore;
use qrpulse_db::migration::{Migrator, MigratorTrait};
use qrpulse_shared::{RetentionConfig, SessionConfig};
use sea_orm::{ConnectOptions, Database};
use serde_json::Value;
use tower::ServiceExt;

use crate::{AppState, create_router};

/// Builds state over a fresh migrated in-memory database.
pub async fn test_state() -> AppState {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let register = SessionRegister::new(Arc::new(SeaOrmClaimStore::new(db.clone())))
        .with_cache(KnownSessionCache::default());

    AppState {
        db: Arc::new(db),
        register: Arc::new(register),
        session: Arc::new(SessionConfig::default()),
        retention: Arc::new(RetentionConfig::default()),
    }
}

/// A response with its body decoded as JSON.
pub struct JsonResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

/// Sends one request through the full router.
pub async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> JsonResponse {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let app: Router = create_router(state.clone());
    let response = app.oneshot(request).await.unwrap();

    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    JsonResponse {
        status,
        set_cookie,
        body,
    }
}

/// Creates region → cluster → branch → QR code over HTTP and returns their IDs.
pub async fn seed(state: &AppState, branch_code: &str) -> Seeded {
    let region = send(
        state,
        "POST",
        "/api/v1/regions",
        Some(serde_json::json!({ "name": format!("Region {branch_code}"), "code": format!("R{branch_code}") })),
        None,
    )
    .await;
    assert_eq!(region.status, StatusCode::CREATED, "{}", region.body);
    let region_id = region.body["id"].as_str().unwrap().to_string();

    let cluster = send(
        state,
        "POST",
        "/api/v1/clusters",
        Some(serde_json::json!({ "region_id": region_id, "name": "Cluster 1", "code": "C1" })),
        None,
    )
    .await;
    assert_eq!(cluster.status, StatusCode::CREATED, "{}", cluster.body);
    let cluster_id = cluster.body["id"].as_str().unwrap().to_string();

    let branch = send(
        state,
        "POST",
        "/api/v1/branches",
        Some(serde_json::json!({ "cluster_id": cluster_id, "name": "Main", "code": branch_code })),
        None,
    )
    .await;
    assert_eq!(branch.status, StatusCode::CREATED, "{}", branch.body);
    let branch_id = branch.body["id"].as_str().unwrap().to_string();

    let qr = send(
        state,
        "POST",
        "/api/v1/qr-codes",
        Some(serde_json::json!({
            "branch_id": branch_id,
            "code": format!("{branch_code}-QR"),
            "target_url": "https://example.com/social-links"
        })),
        None,
    )
    .await;
    assert_eq!(qr.status, StatusCode::CREATED, "{}", qr.body);

    Seeded {
        region_id,
        cluster_id,
        branch_id,
        qr_code_id: qr.body["id"].as_str().unwrap().to_string(),
        qr_code: qr.body["code"].as_str().unwrap().to_string(),
    }
}

/// IDs created by [`seed`].
pub struct Seeded {
    pub region_id: String,
    pub cluster_id: String,
    pub branch_id: String,
    pub qr_code_id: String,
    pub qr_code: String,
}

/// Logs a scan for `session` on a seeded QR code.
pub async fn log_scan(state: &AppState, qr_code_id: &str, session: &str) -> JsonResponse {
    let response = send(
        state,
        "POST",
        "/api/v1/scan-log",
        Some(serde_json::json!({ "qr_code_id": qr_code_id, "session_id": session })),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    response
}

/// Logs a social click for `session`, attributed through a QR code's public code.
pub async fn log_click(
    state: &AppState,
    platform: &str,
    qr_code: &str,
    session: &str,
) -> JsonResponse {
    let response = send(
        state,
        "POST",
        "/api/v1/social-click",
        Some(serde_json::json!({
            "platform": platform,
            "branch_code": qr_code,
            "session_id": session
        })),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    response
}
