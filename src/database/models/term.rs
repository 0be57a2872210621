use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

use crate::database::entity::{not_blank, present, require, Entity, FieldErrors};
use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Term {
    pub id: i32,
    pub school_year_id: i32,
    pub name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermPayload {
    pub school_year_id: Option<i32>,
    pub name: Option<String>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

#[async_trait]
impl Entity for Term {
    const TABLE: &'static str = "terms";
    const PATH: &'static str = "terms";
    const FILTERS: &'static [&'static str] = &["school_year_id"];

    type Payload = TermPayload;

    fn validate_create(payload: &Self::Payload) -> Result<(), FieldErrors> {
        require(&[
            ("school_year_id", payload.school_year_id.is_some()),
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
            "INSERT INTO terms (school_year_id, name, starts_on, ends_on) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(payload.school_year_id)
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
            "UPDATE terms SET \
                school_year_id = COALESCE($2, school_year_id), \
                name = COALESCE($3, name), \
                starts_on = COALESCE($4, starts_on), \
                ends_on = COALESCE($5, ends_on) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(payload.school_year_id)
        .bind(&payload.name)
        .bind(payload.starts_on)
        .bind(payload.ends_on)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }
}
