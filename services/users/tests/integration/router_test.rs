use axum::http::StatusCode;
use axum_test::TestServer;
use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};

use keel_users::infra::password::Argon2Hasher;
use keel_users::router::build_router;
use keel_users::state::AppState;

use crate::helpers::DEFAULT_ROLE_ID;

/// Router over a disconnected database: only routes that fail before any query can succeed.
fn server() -> TestServer {
    server_with(DatabaseConnection::default())
}

fn server_with(db: DatabaseConnection) -> TestServer {
    let state = AppState {
        db,
        hasher: Argon2Hasher::default(),
        default_role_id: DEFAULT_ROLE_ID.into(),
    };
    TestServer::new(build_router(state)).unwrap()
}

#[tokio::test]
async fn should_report_liveness() {
    let response = server().get("/healthz").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn should_report_not_ready_without_database() {
    let response = server().get("/readyz").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_attach_request_id_to_response() {
    let response = server().get("/healthz").await;
    let id = response.header("x-request-id");
    assert!(!id.to_str().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_malformed_list_query() {
    let response = server()
        .get("/users")
        .add_raw_query_param("page=abc")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "MISSING_DATA");
}

#[tokio::test]
async fn should_require_email_for_resources() {
    let response = server().get("/users/resources").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "MISSING_DATA");
}

#[tokio::test]
async fn should_reject_blank_user_id_on_update() {
    let response = server()
        .patch("/users/%20")
        .json(&serde_json::json!({ "name": "x" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "INVALID_ID");
}

#[tokio::test]
async fn should_surface_database_failure_as_internal() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom("connection reset".into())])
        .into_connection();
    let response = server_with(db).get("/users/u1").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "INTERNAL");
    assert_eq!(body["message"], "internal error");
}
