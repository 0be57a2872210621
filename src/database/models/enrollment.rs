use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

use crate::database::entity::{require, Entity, FieldErrors};
use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Enrollment {
    pub id: i32,
    pub class_id: i32,
    pub student_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrollmentPayload {
    pub class_id: Option<i32>,
    pub student_id: Option<i32>,
}

#[async_trait]
impl Entity for Enrollment {
    const TABLE: &'static str = "enrollments";
    const PATH: &'static str = "enrollments";
    const FILTERS: &'static [&'static str] = &["class_id", "student_id"];

    type Payload = EnrollmentPayload;

    fn validate_create(payload: &Self::Payload) -> Result<(), FieldErrors> {
        require(&[
            ("class_id", payload.class_id.is_some()),
            ("student_id", payload.student_id.is_some()),
        ])
    }

    async fn insert(conn: &mut PgConnection, payload: &Self::Payload) -> Result<Self, DatabaseError> {
        let row = sqlx::query_as::<_, Self>(
            "INSERT INTO enrollments (class_id, student_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(payload.class_id)
        .bind(payload.student_id)
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
            "UPDATE enrollments SET \
                class_id = COALESCE($2, class_id), \
                student_id = COALESCE($3, student_id) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(payload.class_id)
        .bind(payload.student_id)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }
}
