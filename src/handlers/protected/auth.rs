// handlers/protected/auth.rs - Session endpoints for authenticated users

use axum::extract::{Extension, State};
use serde::Serialize;

use crate::app::AppState;
use crate::auth::{generate_jwt, Claims};
use crate::database::models::User;
use crate::database::Repository;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_in: i64,
}

/// GET /api/auth/whoami - The caller's own account
pub async fn whoami(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<User> {
    let user = Repository::<User>::new(&state.db).get(auth_user.user_id).await?;
    Ok(ApiResponse::success(user))
}

/// POST /api/auth/refresh - New token for the same identity
pub async fn refresh(Extension(auth_user): Extension<AuthUser>) -> ApiResult<TokenResponse> {
    let claims = Claims::new(auth_user.username, auth_user.user_id, auth_user.role);
    let token = generate_jwt(&claims)?;

    Ok(ApiResponse::success(TokenResponse {
        token,
        expires_in: claims.expires_in(),
    }))
}
