use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

use crate::database::entity::{not_blank, present, require, Entity, FieldErrors};
use crate::database::manager::DatabaseError;

/// Link between a student and one of their guardians
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentGuardian {
    pub id: i32,
    pub student_id: i32,
    pub guardian_id: i32,
    pub relationship: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentGuardianPayload {
    pub student_id: Option<i32>,
    pub guardian_id: Option<i32>,
    pub relationship: Option<String>,
}

#[async_trait]
impl Entity for StudentGuardian {
    const TABLE: &'static str = "student_guardians";
    const PATH: &'static str = "student-guardians";
    const FILTERS: &'static [&'static str] = &["student_id", "guardian_id"];

    type Payload = StudentGuardianPayload;

    fn validate_create(payload: &Self::Payload) -> Result<(), FieldErrors> {
        require(&[
            ("student_id", payload.student_id.is_some()),
            ("guardian_id", payload.guardian_id.is_some()),
            ("relationship", present(&payload.relationship)),
        ])
    }

    fn validate_update(payload: &Self::Payload) -> Result<(), FieldErrors> {
        not_blank(&[("relationship", &payload.relationship)])
    }

    async fn insert(conn: &mut PgConnection, payload: &Self::Payload) -> Result<Self, DatabaseError> {
        let row = sqlx::query_as::<_, Self>(
            "INSERT INTO student_guardians (student_id, guardian_id, relationship) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(payload.student_id)
        .bind(payload.guardian_id)
        .bind(&payload.relationship)
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
            "UPDATE student_guardians SET \
                student_id = COALESCE($2, student_id), \
                guardian_id = COALESCE($3, guardian_id), \
                relationship = COALESCE($4, relationship) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(payload.student_id)
        .bind(payload.guardian_id)
        .bind(&payload.relationship)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }
}
