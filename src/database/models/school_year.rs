use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

use crate::database::entity::{not_blank, present, require, Entity, FieldErrors};
use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SchoolYear {
    pub id: i32,
    pub name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchoolYearPayload {
    pub name: Option<String>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

#[async_trait]
impl Entity for SchoolYear {
    const TABLE: &'static str = "school_years";
    const PATH: &'static str = "school-years";

    type Payload = SchoolYearPayload;

    fn validate_create(payload: &Self::Payload) -> Result<(), FieldErrors> {
        require(&[
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
            "INSERT INTO school_years (name, starts_on, ends_on) VALUES ($1, $2, $3) RETURNING *",
        )
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
            "UPDATE school_years SET \
                name = COALESCE($2, name), \
                starts_on = COALESCE($3, starts_on), \
                ends_on = COALESCE($4, ends_on) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&payload.name)
        .bind(payload.starts_on)
        .bind(payload.ends_on)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_needs_name_and_both_dates() {
        let payload: SchoolYearPayload =
            serde_json::from_value(serde_json::json!({ "name": "2024-2025", "starts_on": "2024-09-01" })).unwrap();

        let errors = SchoolYear::validate_create(&payload).unwrap_err();
        assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["ends_on"]);
    }
}
