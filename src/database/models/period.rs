use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

use crate::database::entity::{not_blank, present, require, Entity, FieldErrors};
use crate::database::manager::DatabaseError;

/// A grading period inside a term
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Period {
    pub id: i32,
    pub term_id: i32,
    pub name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodPayload {
    pub term_id: Option<i32>,
    pub name: Option<String>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

#[async_trait]
impl Entity for Period {
    const TABLE: &'static str = "periods";
    const PATH: &'static str = "periods";
    const FILTERS: &'static [&'static str] = &["term_id"];

    type Payload = PeriodPayload;

    fn validate_create(payload: &Self::Payload) -> Result<(), FieldErrors> {
        require(&[
            ("term_id", payload.term_id.is_some()),
            ("name", present(&payload.name)),
            ("starts_on", payload.starts_on.is_some()),
            ("ends_on", payload.ends_on.is_some()),
        ])
    }

    fn validate_update(payload: &Self::Payload) -> Result<(), FieldErrors> {
        not_blank(&[("name", &payload.name)])
    }

    async fn insert(conn: &mut PgConnection, payload: &Self::Payload) -> Result<Self, DatabaseError> {
        let row = sqlx::query_as::<_, Self>(
            "INSERT INTO periods (term_id, name, starts_on, ends_on) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(payload.term_id)
        .bind(&payload.name)
        .bind(payload.starts_on)
        .bind(payload.ends_on)
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
            "UPDATE periods SET \
                term_id = COALESCE($2, term_id), \
                name = COALESCE($3, name), \
                starts_on = COALESCE($4, starts_on), \
                ends_on = COALESCE($5, ends_on) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(payload.term_id)
        .bind(&payload.name)
        .bind(payload.starts_on)
        .bind(payload.ends_on)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }
}
