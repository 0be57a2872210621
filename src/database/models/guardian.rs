use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

use crate::database::entity::{not_blank, present, require, Entity, FieldErrors};
use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Guardian {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuardianPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[async_trait]
impl Entity for Guardian {
    const TABLE: &'static str = "guardians";
    const PATH: &'static str = "guardians";

    type Payload = GuardianPayload;

    fn validate_create(payload: &Self::Payload) -> Result<(), FieldErrors> {
        require(&[
            ("first_name", present(&payload.first_name)),
            ("last_name", present(&payload.last_name)),
        ])
    }

    fn validate_update(payload: &Self::Payload) -> Result<(), FieldErrors> {
        not_blank(&[("first_name", &payload.first_name), ("last_name", &payload.last_name)])
    }

    async fn insert(conn: &mut PgConnection, payload: &Self::Payload) -> Result<Self, DatabaseError> {
        let row = sqlx::query_as::<_, Self>(
            "INSERT INTO guardians (first_name, last_name, email, phone) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
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
            "UPDATE guardians SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                email = COALESCE($4, email), \
                phone = COALESCE($5, phone) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }
}
