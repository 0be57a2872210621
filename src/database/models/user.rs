use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

use crate::auth::hash_password;
use crate::database::entity::{not_blank, present, require, Entity, FieldErrors};
use crate::database::manager::DatabaseError;
use crate::types::Role;

/// Login account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub full_name: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPayload {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub full_name: Option<String>,
}

impl User {
    /// Role column parsed; unknown values fall back to the least privileged role
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_else(|_| {
            tracing::warn!(user_id = self.id, role = %self.role, "Unknown stored role, treating as guardian");
            Role::Guardian
        })
    }

    pub async fn find_by_username(
        conn: &mut PgConnection,
        username: &str,
    ) -> Result<Option<Self>, DatabaseError> {
        let row = sqlx::query_as::<_, Self>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(conn)
            .await?;

        Ok(row)
    }

    pub async fn list_all(conn: &mut PgConnection) -> Result<Vec<Self>, DatabaseError> {
        let rows = sqlx::query_as::<_, Self>("SELECT * FROM users ORDER BY id")
            .fetch_all(conn)
            .await?;

        Ok(rows)
    }

    pub async fn touch_last_login(conn: &mut PgConnection, id: i32) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn set_password(
        conn: &mut PgConnection,
        username: &str,
        password: &str,
    ) -> Result<bool, DatabaseError> {
        let hash = hash(password)?;
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE username = $1")
            .bind(username)
            .bind(hash)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn hash(password: &str) -> Result<String, DatabaseError> {
    hash_password(password).map_err(|e| DatabaseError::Internal(e.to_string()))
}

fn check_role(role: &Option<String>) -> Result<(), FieldErrors> {
    match role {
        Some(role) => role
            .parse::<Role>()
            .map(|_| ())
            .map_err(|message| FieldErrors::from([("role".to_string(), message)])),
        None => Ok(()),
    }
}

#[async_trait]
impl Entity for User {
    const TABLE: &'static str = "users";
    const PATH: &'static str = "users";
    const READ_ROLES: &'static [Role] = &[Role::Admin];
    const WRITE_ROLES: &'static [Role] = &[Role::Admin];

    type Payload = UserPayload;

    fn validate_create(payload: &Self::Payload) -> Result<(), FieldErrors> {
        require(&[
            ("username", present(&payload.username)),
            ("password", present(&payload.password)),
            ("role", payload.role.is_some()),
        ])?;
        check_role(&payload.role)
    }

    fn validate_update(payload: &Self::Payload) -> Result<(), FieldErrors> {
        not_blank(&[("username", &payload.username), ("password", &payload.password)])?;
        check_role(&payload.role)
    }

    async fn insert(conn: &mut PgConnection, payload: &Self::Payload) -> Result<Self, DatabaseError> {
        let password = payload.password.as_deref().unwrap_or_default();
        let role = payload.role.as_deref().and_then(|r| r.parse::<Role>().ok());

        let row = sqlx::query_as::<_, Self>(
            "INSERT INTO users (username, password_hash, role, full_name) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&payload.username)
        .bind(hash(password)?)
        .bind(role.map(|r| r.as_str()))
        .bind(&payload.full_name)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    async fn update(
        conn: &mut PgConnection,
        id: i32,
        payload: &Self::Payload,
    ) -> Result<Option<Self>, DatabaseError> {
        let password_hash = payload.password.as_deref().map(hash).transpose()?;
        let role = payload.role.as_deref().and_then(|r| r.parse::<Role>().ok());

        let row = sqlx::query_as::<_, Self>(
            "UPDATE users SET \
                username = COALESCE($2, username), \
                password_hash = COALESCE($3, password_hash), \
                role = COALESCE($4, role), \
                full_name = COALESCE($5, full_name) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&payload.username)
        .bind(password_hash)
        .bind(role.map(|r| r.as_str()))
        .bind(&payload.full_name)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }
}
