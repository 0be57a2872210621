// handlers/protected/audit.rs - GET /api/audit

use axum::extract::{rejection::QueryRejection, Extension, Query, State};

use crate::app::AppState;
use crate::audit::log::{query_audit_log, AuditEntry, AuditQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::types::Role;

/// GET /api/audit?table=&row_id=&actor=&limit=&offset= - Change history, newest first (admin only)
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> ApiResult<Vec<AuditEntry>> {
    auth_user.require_any(&[Role::Admin])?;
    let Query(query) = query?;

    let entries = query_audit_log(state.db.pool(), &query).await?;
    Ok(ApiResponse::success(entries))
}
