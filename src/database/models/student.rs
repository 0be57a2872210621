use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

use crate::database::entity::{not_blank, present, require, Entity, FieldErrors};
use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Student {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub enrolled_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub enrolled_on: Option<NaiveDate>,
}

#[async_trait]
impl Entity for Student {
    const TABLE: &'static str = "students";
    const PATH: &'static str = "students";

    type Payload = StudentPayload;

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
            "INSERT INTO students (first_name, last_name, email, date_of_birth, enrolled_on) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.email)
        .bind(payload.date_of_birth)
        .bind(payload.enrolled_on)
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
            "UPDATE students SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                email = COALESCE($4, email), \
                date_of_birth = COALESCE($5, date_of_birth), \
                enrolled_on = COALESCE($6, enrolled_on) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.email)
        .bind(payload.date_of_birth)
        .bind(payload.enrolled_on)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_update_accepts_single_field() {
        let payload: StudentPayload = serde_json::from_value(serde_json::json!({ "email": "ada@school.test" })).unwrap();
        assert!(Student::validate_update(&payload).is_ok());
        assert!(Student::validate_create(&payload).is_err());
    }

    #[test]
    fn blank_name_rejected_on_update() {
        let payload = StudentPayload {
            last_name: Some("  ".to_string()),
            ..Default::default()
        };
        let errors = Student::validate_update(&payload).unwrap_err();
        assert!(errors.contains_key("last_name"));
    }
}
