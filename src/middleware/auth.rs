use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use serde::Serialize;

use crate::auth::{validate_jwt, Claims};
use crate::context::{Actor, RequestContext};
use crate::error::ApiError;
use crate::types::Role;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub username: String,
    pub user_id: i32,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.sub,
            user_id: claims.user_id,
            role: claims.role,
        }
    }
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.username.clone())
    }

    /// 403 unless the caller holds one of `roles`
    pub fn require_any(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            tracing::debug!(user = %self.username, role = %self.role, "Role not permitted");
            Err(ApiError::forbidden(format!(
                "Role '{}' is not permitted to perform this action",
                self.role
            )))
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context.
///
/// On success the request carries both an [`AuthUser`] and a
/// [`RequestContext`] whose actor is the token's subject.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = validate_jwt(&token)?;

    let auth_user = AuthUser::from(claims);
    let ctx = RequestContext::for_actor(auth_user.actor());

    tracing::debug!(user = %auth_user.username, request_id = %ctx.request_id(), "Authenticated request");

    request.extensions_mut().insert(auth_user);
    request.extensions_mut().insert(ctx);

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn non_bearer_schemes_are_rejected() {
        assert!(extract_jwt_from_headers(&headers("Basic dXNlcjpwdw==")).is_err());
        assert!(extract_jwt_from_headers(&headers("Bearer   ")).is_err());
        assert!(extract_jwt_from_headers(&HeaderMap::new()).is_err());
    }

    #[test]
    fn require_any_checks_role() {
        let user = AuthUser::from(Claims::with_expiry("pat".to_string(), 3, Role::Professor, 1));
        assert!(user.require_any(&[Role::Admin, Role::Professor]).is_ok());

        let err = user.require_any(&[Role::Admin]).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
