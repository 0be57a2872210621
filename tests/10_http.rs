mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{offline_app, send, token_for};
use school_api::types::Role;

#[tokio::test]
async fn root_describes_the_service() {
    let app = offline_app();
    let (status, body) = send(&app, Method::GET, "/", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "school-api");
}

#[tokio::test]
async fn health_reports_unavailable_database() {
    let app = offline_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn api_requires_a_bearer_token() {
    let app = offline_app();
    let (status, body) = send(&app, Method::GET, "/api/students", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = offline_app();
    let (status, _) = send(&app, Method::GET, "/api/students", Some("not.a.jwt"), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn student_cannot_create_departments() {
    let app = offline_app();
    let token = token_for("sam", 11, Role::Student);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/departments",
        Some(&token),
        Some(json!({ "name": "Physics" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn only_admins_read_users() {
    let app = offline_app();
    let token = token_for("pat", 3, Role::Professor);

    let (status, _) = send(&app, Method::GET, "/api/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/api/audit", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_validates_before_touching_the_database() {
    let app = offline_app();
    let token = token_for("alice", 1, Role::Staff);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/classes",
        Some(&token),
        Some(json!({ "name": "Algebra I" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["subject_id"].is_string());
    assert!(body["field_errors"]["term_id"].is_string());
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = offline_app();
    let token = token_for("alice", 1, Role::Staff);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/students",
        Some(&token),
        Some(json!({ "first_name": 42 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
}

#[tokio::test]
async fn non_numeric_id_gets_an_error_envelope() {
    let app = offline_app();
    let token = token_for("alice", 1, Role::Admin);

    for method in [Method::GET, Method::DELETE] {
        let (status, body) = send(&app, method, "/api/students/abc", Some(&token), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn bad_audit_query_gets_an_error_envelope() {
    let app = offline_app();
    let token = token_for("root", 1, Role::Admin);

    let (status, body) = send(&app, Method::GET, "/api/audit?limit=abc", Some(&token), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn login_requires_credentials() {
    let app = offline_app();
    let (status, body) = send(&app, Method::POST, "/auth/login", None, Some(json!({ "username": "alice" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn refresh_issues_a_new_token() {
    let app = offline_app();
    let token = token_for("alice", 1, Role::Admin);

    let (status, body) = send(&app, Method::POST, "/api/auth/refresh", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["data"]["expires_in"].as_i64().unwrap() > 0);
}
