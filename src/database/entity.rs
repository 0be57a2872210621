use std::collections::HashMap;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{postgres::PgRow, FromRow, PgConnection};

use crate::database::manager::DatabaseError;
use crate::types::Role;

/// Field name -> problem description, surfaced to clients as `field_errors`
pub type FieldErrors = HashMap<String, String>;

/// A table exposed as a REST resource.
///
/// The row type doubles as the serializer: whatever `Serialize` emits is the
/// JSON body returned to clients.
#[async_trait]
pub trait Entity: for<'r> FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + 'static {
    /// Table name, used verbatim in generated SQL
    const TABLE: &'static str;

    /// URL segment under `/api/`
    const PATH: &'static str;

    /// Integer columns accepted as equality filters on list requests
    const FILTERS: &'static [&'static str] = &[];

    const READ_ROLES: &'static [Role] = Role::ALL;
    const WRITE_ROLES: &'static [Role] = &[Role::Admin, Role::Staff];

    /// Request body for create and update. Every field is optional so one type
    /// serves both; `validate_create` enforces what a new row needs.
    type Payload: DeserializeOwned + Send + Sync + 'static;

    fn validate_create(payload: &Self::Payload) -> Result<(), FieldErrors>;

    fn validate_update(_payload: &Self::Payload) -> Result<(), FieldErrors> {
        Ok(())
    }

    async fn insert(conn: &mut PgConnection, payload: &Self::Payload) -> Result<Self, DatabaseError>;

    /// Apply the fields present in `payload`; absent fields keep their value.
    /// Returns `None` when no row has `id`.
    ///
    /// Implementations `COALESCE` each column with its bound value, so an
    /// explicit `null` reads the same as an absent field: a nullable column
    /// such as `classes.professor_id` cannot be cleared through an update.
    async fn update(
        conn: &mut PgConnection,
        id: i32,
        payload: &Self::Payload,
    ) -> Result<Option<Self>, DatabaseError>;
}

/// Collect a "This field is required" error for every check that failed
pub fn require(checks: &[(&str, bool)]) -> Result<(), FieldErrors> {
    let missing: FieldErrors = checks
        .iter()
        .filter(|(_, ok)| !ok)
        .map(|(field, _)| (field.to_string(), "This field is required".to_string()))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}

/// A string field counts as present when it is set and not blank
pub fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Reject explicitly blank strings on update (absent is fine)
pub fn not_blank(checks: &[(&str, &Option<String>)]) -> Result<(), FieldErrors> {
    let blank: FieldErrors = checks
        .iter()
        .filter(|(_, value)| value.as_deref().is_some_and(|s| s.trim().is_empty()))
        .map(|(field, _)| (field.to_string(), "This field cannot be blank".to_string()))
        .collect();

    if blank.is_empty() {
        Ok(())
    } else {
        Err(blank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_reports_each_missing_field() {
        let errors = require(&[("name", false), ("code", true), ("department_id", false)]).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("department_id"));
    }

    #[test]
    fn blank_strings_are_not_present() {
        assert!(!present(&None));
        assert!(!present(&Some("   ".to_string())));
        assert!(present(&Some("Maths".to_string())));
    }

    #[test]
    fn not_blank_allows_absent_fields() {
        assert!(not_blank(&[("name", &None)]).is_ok());
        assert!(not_blank(&[("name", &Some(String::new()))]).is_err());
    }
}
