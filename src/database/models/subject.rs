use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

use crate::database::entity::{not_blank, present, require, Entity, FieldErrors};
use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Subject {
    pub id: i32,
    pub department_id: i32,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectPayload {
    pub department_id: Option<i32>,
    pub name: Option<String>,
    pub code: Option<String>,
}

#[async_trait]
impl Entity for Subject {
    const TABLE: &'static str = "subjects";
    const PATH: &'static str = "subjects";
    const FILTERS: &'static [&'static str] = &["department_id"];

    type Payload = SubjectPayload;

    fn validate_create(payload: &Self::Payload) -> Result<(), FieldErrors> {
        require(&[
            ("department_id", payload.department_id.is_some()),
            ("name", present(&payload.name)),
            ("code", present(&payload.code)),
        ])
    }

    fn validate_update(payload: &Self::Payload) -> Result<(), FieldErrors> {
        not_blank(&[("name", &payload.name), ("code", &payload.code)])
    }

    async fn insert(conn: &mut PgConnection, payload: &Self::Payload) -> Result<Self, DatabaseError> {
        let row = sqlx::query_as::<_, Self>(
            "INSERT INTO subjects (department_id, name, code) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(payload.department_id)
        .bind(&payload.name)
        .bind(&payload.code)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    async fn update(
        conn: &mut PgConnection,
        id: i32,
        payload: &Self::Payload,
    ) -> Result<Option<Self>, DatabaseError> {
        let row = sqlx::query_as::<_, Self>(
            "UPDATE subjects SET \
                department_id = COALESCE($2, department_id), \
                name = COALESCE($3, name), \
                code = COALESCE($4, code) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(payload.department_id)
        .bind(&payload.name)
        .bind(&payload.code)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }
}
