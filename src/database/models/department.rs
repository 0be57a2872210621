use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

use crate::database::entity::{not_blank, present, require, Entity, FieldErrors};
use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Department {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentPayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[async_trait]
impl Entity for Department {
    const TABLE: &'static str = "departments";
    const PATH: &'static str = "departments";

    type Payload = DepartmentPayload;

    fn validate_create(payload: &Self::Payload) -> Result<(), FieldErrors> {
        require(&[("name", present(&payload.name))])
    }

    fn validate_update(payload: &Self::Payload) -> Result<(), FieldErrors> {
        not_blank(&[("name", &payload.name)])
    }

    async fn insert(conn: &mut PgConnection, payload: &Self::Payload) -> Result<Self, DatabaseError> {
        let row = sqlx::query_as::<_, Self>(
            "INSERT INTO departments (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&payload.name)
        .bind(&payload.description)
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
            "UPDATE departments SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.description)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }
}
