use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

use crate::database::entity::{not_blank, present, require, Entity, FieldErrors};
use crate::database::manager::DatabaseError;

/// A subject taught in a given term, optionally by a professor
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Class {
    pub id: i32,
    pub subject_id: i32,
    pub term_id: i32,
    pub professor_id: Option<i32>,
    pub name: String,
    pub room: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassPayload {
    pub subject_id: Option<i32>,
    pub term_id: Option<i32>,
    pub professor_id: Option<i32>,
    pub name: Option<String>,
    pub room: Option<String>,
}

#[async_trait]
impl Entity for Class {
    const TABLE: &'static str = "classes";
    const PATH: &'static str = "classes";
    const FILTERS: &'static [&'static str] = &["subject_id", "term_id", "professor_id"];

    type Payload = ClassPayload;

    fn validate_create(payload: &Self::Payload) -> Result<(), FieldErrors> {
        require(&[
            ("subject_id", payload.subject_id.is_some()),
            ("term_id", payload.term_id.is_some()),
            ("name", present(&payload.name)),
        ])
    }

    fn validate_update(payload: &Self::Payload) -> Result<(), FieldErrors> {
        not_blank(&[("name", &payload.name)])
    }

    async fn insert(conn: &mut PgConnection, payload: &Self::Payload) -> Result<Self, DatabaseError> {
        let row = sqlx::query_as::<_, Self>(
            "INSERT INTO classes (subject_id, term_id, professor_id, name, room) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(payload.subject_id)
        .bind(payload.term_id)
        .bind(payload.professor_id)
        .bind(&payload.name)
        .bind(&payload.room)
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
            "UPDATE classes SET \
                subject_id = COALESCE($2, subject_id), \
                term_id = COALESCE($3, term_id), \
                professor_id = COALESCE($4, professor_id), \
                name = COALESCE($5, name), \
                room = COALESCE($6, room) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(payload.subject_id)
        .bind(payload.term_id)
        .bind(payload.professor_id)
        .bind(&payload.name)
        .bind(&payload.room)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }
}
