// handlers/public/auth.rs - POST /auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::{generate_jwt, verify_password, Claims};
use crate::context::{Actor, RequestContext};
use crate::database::models::User;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    pub expires_in: i64,
}

/// POST /auth/login - Authenticate and receive a JWT
///
/// ```json
/// { "username": "alice", "password": "..." }
/// ```
///
/// Returns `{ token, user, expires_in }`. The `last_login_at` update runs in a
/// transaction attributed to the user who just logged in.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = payload?;

    let username = request.username.unwrap_or_default();
    let password = request.password.unwrap_or_default();
    if username.trim().is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let mut conn = state.db.pool().acquire().await.map_err(DatabaseError::from)?;
    let user = User::find_by_username(&mut conn, username.trim()).await?;
    drop(conn);

    let Some(user) = user else {
        warn!(username = %username, "Login failed: unknown user");
        return Err(invalid_credentials());
    };

    let verified = verify_password(&password, &user.password_hash).map_err(|e| {
        tracing::error!(user = %user.username, "Stored password hash unusable: {}", e);
        ApiError::internal_server_error("Unable to verify credentials")
    })?;
    if !verified {
        warn!(username = %user.username, "Login failed: wrong password");
        return Err(invalid_credentials());
    }

    let ctx = RequestContext::for_actor(Actor::new(user.username.clone()));
    let mut tx = state.db.begin(Some(&ctx)).await?;
    User::touch_last_login(&mut tx, user.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    let claims = Claims::new(user.username.clone(), user.id, user.role());
    let token = generate_jwt(&claims)?;

    info!(user = %user.username, role = %claims.role, "User logged in");

    Ok(ApiResponse::success(LoginResponse {
        token,
        expires_in: claims.expires_in(),
        user,
    }))
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid username or password")
}
