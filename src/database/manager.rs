use std::sync::Arc;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::context::RequestContext;
use crate::database::hooks::TransactionHook;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return DatabaseError::NotFound("Record not found".to_string());
        }

        let classified = match &err {
            sqlx::Error::Database(db_err) => {
                let detail = db_err
                    .constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| db_err.message().to_string());

                // SQLSTATE class 23 (integrity) and 22P02 (bad text representation)
                match db_err.code().as_deref() {
                    Some("23505") => Some(DatabaseError::Conflict(detail)),
                    Some("23503") => Some(DatabaseError::InvalidReference(detail)),
                    Some("23502") | Some("23514") | Some("22P02") => {
                        Some(DatabaseError::ConstraintViolation(detail))
                    }
                    _ => None,
                }
            }
            _ => None,
        };

        classified.unwrap_or(DatabaseError::Sqlx(err))
    }
}

/// Connection pool plus the hooks every transaction runs when it begins.
///
/// All writes go through [`Database::begin`]; that is the single place where a
/// connection is bound to a transaction, so it is where hooks fire. Nested
/// `Transaction::begin` calls become savepoints inside sqlx and never reach
/// this code path, so hooks run once per top-level transaction.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    hooks: Vec<Arc<dyn TransactionHook>>,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            hooks: Vec::new(),
        }
    }

    /// Open a pool using the configured limits
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }

        let pool = Self::pool_options(config).connect(&config.url).await?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Database connection pool established"
        );
        Ok(Self::new(pool))
    }

    /// Build a pool without connecting; connections are made on first use
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }

        let pool = Self::pool_options(config).connect_lazy(&config.url)?;
        Ok(Self::new(pool))
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    /// Register a hook to run at the start of every transaction
    pub fn with_hook<H>(mut self, hook: H) -> Self
    where
        H: TransactionHook + 'static,
    {
        debug!(hook = hook.name(), "Registered transaction hook");
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction and run every registered hook on it before handing
    /// it back. `ctx` is `None` for work that is not driven by a request.
    pub async fn begin(
        &self,
        ctx: Option<&RequestContext>,
    ) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        for hook in &self.hooks {
            hook.after_begin(&mut *tx, ctx).await;
        }

        debug!(
            request_id = ?ctx.map(RequestContext::request_id),
            hooks = self.hooks.len(),
            "Transaction started"
        );
        Ok(tx)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Apply the embedded migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_url(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_connections: 2,
            min_connections: 0,
            connection_timeout: 1,
            run_migrations: false,
        }
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[test]
    fn other_driver_errors_pass_through() {
        let err = DatabaseError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)));
    }

    #[tokio::test]
    async fn connect_requires_a_url() {
        let result = Database::connect(&config_with_url("")).await;
        assert!(matches!(result, Err(DatabaseError::ConfigMissing("DATABASE_URL"))));
    }

    #[tokio::test]
    async fn lazy_pool_does_not_touch_the_network() {
        let db = Database::connect_lazy(&config_with_url("postgres://school@127.0.0.1:1/school"))
            .expect("lazy pool should build from a well-formed url");
        assert_eq!(db.pool().size(), 0);
    }
}
