use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

use crate::database::entity::{not_blank, present, require, Entity, FieldErrors};
use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Professor {
    pub id: i32,
    pub department_id: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfessorPayload {
    pub department_id: Option<i32>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[async_trait]
impl Entity for Professor {
    const TABLE: &'static str = "professors";
    const PATH: &'static str = "professors";
    const FILTERS: &'static [&'static str] = &["department_id"];

    type Payload = ProfessorPayload;

    fn validate_create(payload: &Self::Payload) -> Result<(), FieldErrors> {
        require(&[
            ("first_name", present(&payload.first_name)),
            ("last_name", present(&payload.last_name)),
            ("email", present(&payload.email)),
        ])
    }

    fn validate_update(payload: &Self::Payload) -> Result<(), FieldErrors> {
        not_blank(&[
            ("first_name", &payload.first_name),
            ("last_name", &payload.last_name),
            ("email", &payload.email),
        ])
    }

    async fn insert(conn: &mut PgConnection, payload: &Self::Payload) -> Result<Self, DatabaseError> {
        let row = sqlx::query_as::<_, Self>(
            "INSERT INTO professors (department_id, first_name, last_name, email, phone) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(payload.department_id)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.email)
        .bind(&payload.phone)
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
            "UPDATE professors SET \
                department_id = COALESCE($2, department_id), \
                first_name = COALESCE($3, first_name), \
                last_name = COALESCE($4, last_name), \
                email = COALESCE($5, email), \
                phone = COALESCE($6, phone) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(payload.department_id)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }
}
