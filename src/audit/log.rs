//! Read side of the `audit_log` table written by the database triggers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::database::DatabaseError;

pub const DEFAULT_AUDIT_QUERY_LIMIT: i64 = 100;
pub const MAX_AUDIT_QUERY_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditEntry {
    pub id: i64,
    pub table_name: String,
    pub row_id: Option<String>,
    pub action: String,
    /// NULL when the write happened without an authenticated actor
    pub actor: Option<String>,
    pub changed_at: DateTime<Utc>,
    pub row_data: Option<serde_json::Value>,
}

/// Filters for `GET /api/audit`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub table: Option<String>,
    pub row_id: Option<String>,
    pub actor: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_AUDIT_QUERY_LIMIT)
            .clamp(1, MAX_AUDIT_QUERY_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Newest entries first
pub async fn query_audit_log(pool: &PgPool, query: &AuditQuery) -> Result<Vec<AuditEntry>, DatabaseError> {
    let mut sql = QueryBuilder::<Postgres>::new(
        "SELECT id, table_name, row_id, action, actor, changed_at, row_data FROM audit_log WHERE 1=1",
    );

    if let Some(table) = &query.table {
        sql.push(" AND table_name = ").push_bind(table);
    }
    if let Some(row_id) = &query.row_id {
        sql.push(" AND row_id = ").push_bind(row_id);
    }
    if let Some(actor) = &query.actor {
        sql.push(" AND actor = ").push_bind(actor);
    }

    sql.push(" ORDER BY id DESC LIMIT ")
        .push_bind(query.limit())
        .push(" OFFSET ")
        .push_bind(query.offset());

    let records = sql.build_query_as::<AuditEntry>().fetch_all(pool).await?;

    debug!(count = records.len(), "Queried audit log");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_capped() {
        let query = AuditQuery {
            limit: Some(50_000),
            offset: Some(-1),
            ..Default::default()
        };
        assert_eq!(query.limit(), MAX_AUDIT_QUERY_LIMIT);
        assert_eq!(query.offset(), 0);
        assert_eq!(AuditQuery::default().limit(), DEFAULT_AUDIT_QUERY_LIMIT);
    }
}
