// handlers/protected/resource.rs - Generic CRUD handlers, instantiated once per entity
//
// GET    /api/{path}        list (limit, offset, reference filters)
// POST   /api/{path}        create
// GET    /api/{path}/:id    fetch one
// PUT    /api/{path}/:id    update (PATCH is an alias; both are partial)
// DELETE /api/{path}/:id    delete

use std::collections::HashMap;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::Json;

use crate::app::AppState;
use crate::context::RequestContext;
use crate::database::{Entity, Filters, Page, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

pub async fn list<T: Entity>(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<T>> {
    auth_user.require_any(T::READ_ROLES)?;

    let page = page_from_params(&params, &state)?;
    let filters = Filters::from_params::<T>(&params)?;

    let rows = Repository::<T>::new(&state.db).list(&filters, page).await?;
    Ok(ApiResponse::success(rows))
}

pub async fn get<T: Entity>(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<T> {
    auth_user.require_any(T::READ_ROLES)?;
    let Path(id) = id?;

    let row = Repository::<T>::new(&state.db).get(id).await?;
    Ok(ApiResponse::success(row))
}

pub async fn create<T: Entity>(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<T::Payload>, JsonRejection>,
) -> ApiResult<T> {
    auth_user.require_any(T::WRITE_ROLES)?;

    let Json(payload) = payload?;
    T::validate_create(&payload)?;

    let row = Repository::<T>::new(&state.db).create(Some(&ctx), &payload).await?;
    tracing::info!(table = T::TABLE, user = %auth_user.username, "Created record");
    Ok(ApiResponse::created(row))
}

pub async fn update<T: Entity>(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(ctx): Extension<RequestContext>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<T::Payload>, JsonRejection>,
) -> ApiResult<T> {
    auth_user.require_any(T::WRITE_ROLES)?;

    let Path(id) = id?;
    let Json(payload) = payload?;
    T::validate_update(&payload)?;

    let row = Repository::<T>::new(&state.db).update(Some(&ctx), id, &payload).await?;
    tracing::info!(table = T::TABLE, id, user = %auth_user.username, "Updated record");
    Ok(ApiResponse::success(row))
}

pub async fn delete<T: Entity>(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(ctx): Extension<RequestContext>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<()> {
    auth_user.require_any(T::WRITE_ROLES)?;
    let Path(id) = id?;

    Repository::<T>::new(&state.db).delete(Some(&ctx), id).await?;
    tracing::info!(table = T::TABLE, id, user = %auth_user.username, "Deleted record");
    Ok(ApiResponse::no_content())
}

fn page_from_params(params: &HashMap<String, String>, state: &AppState) -> Result<Page, ApiError> {
    let parse = |key: &str| -> Result<Option<i64>, ApiError> {
        params
            .get(key)
            .map(|raw| {
                raw.trim().parse::<i64>().map_err(|_| {
                    ApiError::validation_error(
                        "Invalid pagination",
                        Some(HashMap::from([(key.to_string(), format!("Expected an integer, got '{}'", raw))])),
                    )
                })
            })
            .transpose()
    };

    Ok(Page::new(
        parse("limit")?,
        parse("offset")?,
        state.default_page_size,
        state.max_page_size,
    ))
}
