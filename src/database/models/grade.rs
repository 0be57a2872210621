use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

use crate::database::entity::{require, Entity, FieldErrors};
use crate::database::manager::DatabaseError;
use crate::types::Role;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Grade {
    pub id: i32,
    pub student_id: i32,
    pub class_id: i32,
    pub period_id: Option<i32>,
    pub score: Decimal,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GradePayload {
    pub student_id: Option<i32>,
    pub class_id: Option<i32>,
    pub period_id: Option<i32>,
    pub score: Option<Decimal>,
    pub comment: Option<String>,
}

/// Scores are percentages with at most two decimal places
fn check_score(score: Option<Decimal>) -> Result<(), FieldErrors> {
    match score {
        Some(score) if score < Decimal::ZERO || score > Decimal::ONE_HUNDRED => Err(FieldErrors::from([(
            "score".to_string(),
            "Score must be between 0 and 100".to_string(),
        )])),
        _ => Ok(()),
    }
}

#[async_trait]
impl Entity for Grade {
    const TABLE: &'static str = "grades";
    const PATH: &'static str = "grades";
    const FILTERS: &'static [&'static str] = &["student_id", "class_id", "period_id"];
    const WRITE_ROLES: &'static [Role] = &[Role::Admin, Role::Staff, Role::Professor];

    type Payload = GradePayload;

    fn validate_create(payload: &Self::Payload) -> Result<(), FieldErrors> {
        require(&[
            ("student_id", payload.student_id.is_some()),
            ("class_id", payload.class_id.is_some()),
            ("score", payload.score.is_some()),
        ])?;
        check_score(payload.score)
    }

    fn validate_update(payload: &Self::Payload) -> Result<(), FieldErrors> {
        check_score(payload.score)
    }

    async fn insert(conn: &mut PgConnection, payload: &Self::Payload) -> Result<Self, DatabaseError> {
        let row = sqlx::query_as::<_, Self>(
            "INSERT INTO grades (student_id, class_id, period_id, score, comment) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(payload.student_id)
        .bind(payload.class_id)
        .bind(payload.period_id)
        .bind(payload.score)
        .bind(&payload.comment)
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
            "UPDATE grades SET \
                student_id = COALESCE($2, student_id), \
                class_id = COALESCE($3, class_id), \
                period_id = COALESCE($4, period_id), \
                score = COALESCE($5, score), \
                comment = COALESCE($6, comment) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(payload.student_id)
        .bind(payload.class_id)
        .bind(payload.period_id)
        .bind(payload.score)
        .bind(&payload.comment)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn score_must_be_a_percentage() {
        let payload = GradePayload {
            student_id: Some(1),
            class_id: Some(2),
            score: Some(Decimal::from_str("100.5").unwrap()),
            ..Default::default()
        };
        let errors = Grade::validate_create(&payload).unwrap_err();
        assert!(errors.contains_key("score"));

        let payload = GradePayload {
            score: Some(Decimal::from_str("87.25").unwrap()),
            ..payload
        };
        assert!(Grade::validate_create(&payload).is_ok());
    }

    #[test]
    fn professors_may_write_grades() {
        assert!(Grade::WRITE_ROLES.contains(&Role::Professor));
        assert!(!Grade::WRITE_ROLES.contains(&Role::Student));
    }
}
