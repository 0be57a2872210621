//! Extension points on the transaction-begin path.

use async_trait::async_trait;
use sqlx::PgConnection;

use crate::context::RequestContext;

/// The part of a transaction's connection that hooks are allowed to touch.
#[async_trait]
pub trait SessionScope: Send {
    /// Set a configuration value that lives until the current transaction
    /// ends. Must be called inside a transaction.
    async fn set_local(&mut self, name: &str, value: &str) -> Result<(), sqlx::Error>;
}

const SET_LOCAL_SAVEPOINT: &str = "session_scope_set_local";

#[async_trait]
impl SessionScope for PgConnection {
    async fn set_local(&mut self, name: &str, value: &str) -> Result<(), sqlx::Error> {
        // A failed statement poisons the whole Postgres transaction, so the
        // write is fenced in a savepoint that can be rolled back on its own.
        sqlx::query(&format!("SAVEPOINT {SET_LOCAL_SAVEPOINT}"))
            .execute(&mut *self)
            .await?;

        let result = sqlx::query("SELECT set_config($1, $2, true)")
            .bind(name)
            .bind(value)
            .execute(&mut *self)
            .await;

        if result.is_err() {
            sqlx::query(&format!("ROLLBACK TO SAVEPOINT {SET_LOCAL_SAVEPOINT}"))
                .execute(&mut *self)
                .await?;
        }
        sqlx::query(&format!("RELEASE SAVEPOINT {SET_LOCAL_SAVEPOINT}"))
            .execute(&mut *self)
            .await?;

        result.map(|_| ())
    }
}

/// Runs once at the start of every top-level transaction opened through
/// [`crate::database::Database::begin`], before any other statement.
///
/// Hooks cannot fail the transaction: anything that goes wrong must be
/// handled (and logged) inside the hook.
#[async_trait]
pub trait TransactionHook: Send + Sync {
    fn name(&self) -> &'static str;

    async fn after_begin(&self, scope: &mut dyn SessionScope, ctx: Option<&RequestContext>);
}
