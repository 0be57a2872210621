#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use school_api::app::{router, AppState};
use school_api::audit::AuditAttribution;
use school_api::auth::{generate_jwt, hash_password, Claims};
use school_api::config::{self, DatabaseConfig};
use school_api::database::Database;
use school_api::types::Role;

/// Nothing listens on port 1, so every query fails fast with a connection error
pub const UNREACHABLE_DATABASE_URL: &str = "postgres://school@127.0.0.1:1/school";

/// Router over a pool that never connects; only routes that reject before
/// touching the database give meaningful answers.
pub fn offline_app() -> Router {
    let db = Database::connect_lazy(&DatabaseConfig {
        url: UNREACHABLE_DATABASE_URL.to_string(),
        max_connections: 1,
        min_connections: 0,
        connection_timeout: 1,
        run_migrations: false,
    })
    .expect("lazy pool");

    let config = config::config();
    router(AppState::new(db, config), config)
}

/// Router over a test pool with audit attribution enabled
pub fn app_with_pool(pool: PgPool) -> Router {
    let db = Database::new(pool).with_hook(AuditAttribution::default());
    let config = config::config();
    router(AppState::new(db, config), config)
}

pub fn token_for(username: &str, user_id: i32, role: Role) -> String {
    generate_jwt(&Claims::new(username.to_string(), user_id, role)).expect("token")
}

/// Insert a login account directly, outside any request
pub async fn seed_user(pool: &PgPool, username: &str, password: &str, role: Role) -> i32 {
    let hash = hash_password(password).expect("hash");
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(username)
    .bind(hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await
    .expect("seed user")
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}
