use std::collections::HashMap;
use std::marker::PhantomData;

use sqlx::{Postgres, QueryBuilder};
use tracing::debug;

use crate::context::RequestContext;
use crate::database::entity::{Entity, FieldErrors};
use crate::database::manager::{Database, DatabaseError};

/// Pagination window for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Clamp a requested window to `1..=max_limit` and a non-negative offset
    pub fn new(limit: Option<i64>, offset: Option<i64>, default_limit: i64, max_limit: i64) -> Self {
        let limit = limit.unwrap_or(default_limit).clamp(1, max_limit.max(1));
        let offset = offset.unwrap_or(0).max(0);
        Self { limit, offset }
    }
}

/// Equality filters on an entity's integer reference columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(Vec<(&'static str, i32)>);

impl Filters {
    /// Pick the entries of `params` that name one of `T::FILTERS`. Unknown
    /// keys are ignored; known keys must hold an integer.
    pub fn from_params<T: Entity>(params: &HashMap<String, String>) -> Result<Self, FieldErrors> {
        let mut filters = Vec::new();
        let mut errors = FieldErrors::new();

        for column in T::FILTERS {
            if let Some(raw) = params.get(*column) {
                match raw.trim().parse::<i32>() {
                    Ok(value) => filters.push((*column, value)),
                    Err(_) => {
                        errors.insert(column.to_string(), format!("Expected an integer id, got '{}'", raw));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(Self(filters))
        } else {
            Err(errors)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// CRUD over one entity table. Reads use the pool directly; every write runs
/// in its own transaction opened with the caller's request context so the
/// transaction hooks see who is writing.
pub struct Repository<'a, T> {
    db: &'a Database,
    _phantom: PhantomData<T>,
}

impl<'a, T> Repository<'a, T>
where
    T: Entity,
{
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            _phantom: PhantomData,
        }
    }

    pub async fn list(&self, filters: &Filters, page: Page) -> Result<Vec<T>, DatabaseError> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {}", T::TABLE));

        for (i, (column, value)) in filters.0.iter().enumerate() {
            query.push(if i == 0 { " WHERE " } else { " AND " });
            query.push(*column).push(" = ").push_bind(*value);
        }

        query
            .push(" ORDER BY id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let rows = query.build_query_as::<T>().fetch_all(self.db.pool()).await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> Result<T, DatabaseError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", T::TABLE);

        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    pub async fn create(
        &self,
        ctx: Option<&RequestContext>,
        payload: &T::Payload,
    ) -> Result<T, DatabaseError> {
        let mut tx = self.db.begin(ctx).await?;
        let row = T::insert(&mut *tx, payload).await?;
        tx.commit().await?;

        debug!(table = T::TABLE, "Inserted row");
        Ok(row)
    }

    pub async fn update(
        &self,
        ctx: Option<&RequestContext>,
        id: i32,
        payload: &T::Payload,
    ) -> Result<T, DatabaseError> {
        let mut tx = self.db.begin(ctx).await?;
        let row = T::update(&mut *tx, id, payload)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        tx.commit().await?;

        debug!(table = T::TABLE, id, "Updated row");
        Ok(row)
    }

    pub async fn delete(&self, ctx: Option<&RequestContext>, id: i32) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);

        let mut tx = self.db.begin(ctx).await?;
        let result = sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }
        tx.commit().await?;

        debug!(table = T::TABLE, id, "Deleted row");
        Ok(())
    }

    fn not_found(id: i32) -> DatabaseError {
        DatabaseError::NotFound(format!("{} record {} not found", T::TABLE, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Term;

    #[test]
    fn page_applies_defaults_and_bounds() {
        assert_eq!(Page::new(None, None, 50, 1000), Page { limit: 50, offset: 0 });
        assert_eq!(Page::new(Some(5000), Some(-3), 50, 1000), Page { limit: 1000, offset: 0 });
        assert_eq!(Page::new(Some(0), Some(20), 50, 1000), Page { limit: 1, offset: 20 });
    }

    #[test]
    fn filters_only_accept_declared_columns() {
        let params = HashMap::from([
            ("school_year_id".to_string(), "7".to_string()),
            ("name; DROP TABLE terms".to_string(), "1".to_string()),
        ]);

        let filters = Filters::from_params::<Term>(&params).unwrap();
        assert_eq!(filters, Filters(vec![("school_year_id", 7)]));
    }

    #[test]
    fn filters_reject_non_integer_ids() {
        let params = HashMap::from([("school_year_id".to_string(), "abc".to_string())]);

        let errors = Filters::from_params::<Term>(&params).unwrap_err();
        assert!(errors.contains_key("school_year_id"));
    }
}
