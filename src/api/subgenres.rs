use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, CreateSubgenreRequest, ReorderSubgenresRequest, SubgenreDto,
    UpdateSubgenreRequest, validation,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubgenreListQuery {
    pub include_inactive: Option<bool>,
}

/// GET /api/subgenres
/// Public list for browse filter chips; inactive entries hidden unless asked.
pub async fn list_subgenres(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SubgenreListQuery>,
) -> Result<Json<ApiResponse<Vec<SubgenreDto>>>, ApiError> {
    let subgenres = state
        .store()
        .list_subgenres(query.include_inactive.unwrap_or(false))
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        subgenres.into_iter().map(SubgenreDto::from).collect(),
    )))
}

/// GET /api/admin/subgenres/{id}
pub async fn get_subgenre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<SubgenreDto>>, ApiError> {
    let subgenre = state
        .store()
        .get_subgenre(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::subgenre_not_found(id))?;

    Ok(Json(ApiResponse::success(subgenre.into())))
}

/// POST /api/admin/subgenres
pub async fn create_subgenre(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSubgenreRequest>,
) -> Result<Json<ApiResponse<SubgenreDto>>, ApiError> {
    let name = validation::validate_subgenre_name(&payload.name)?;
    let slug = match payload.slug.as_deref() {
        Some(slug) => validation::validate_slug(slug)?.to_string(),
        None => validation::slug_from_name(name),
    };

    if state
        .store()
        .get_subgenre_by_slug(&slug)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Subgenre with slug '{slug}' already exists"
        )));
    }

    let subgenre = state
        .store()
        .create_subgenre(name, &slug, payload.is_active)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(subgenre.into())))
}

/// PUT /api/admin/subgenres/{id}
pub async fn update_subgenre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateSubgenreRequest>,
) -> Result<Json<ApiResponse<SubgenreDto>>, ApiError> {
    if let Some(name) = payload.name.as_deref() {
        validation::validate_subgenre_name(name)?;
    }
    if let Some(slug) = payload.slug.as_deref() {
        validation::validate_slug(slug)?;
    }

    let subgenre = state
        .store()
        .update_subgenre(
            id,
            payload.name.as_deref(),
            payload.slug.as_deref(),
            payload.is_active,
        )
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::subgenre_not_found(id))?;

    Ok(Json(ApiResponse::success(subgenre.into())))
}

/// DELETE /api/admin/subgenres/{id}
pub async fn delete_subgenre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let removed = state
        .store()
        .remove_subgenre(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if !removed {
        return Err(ApiError::subgenre_not_found(id));
    }

    Ok(Json(ApiResponse::success(())))
}

/// PUT /api/admin/subgenres/reorder
/// Rewrites the display order to match the submitted id sequence.
pub async fn reorder_subgenres(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReorderSubgenresRequest>,
) -> Result<Json<ApiResponse<Vec<SubgenreDto>>>, ApiError> {
    if payload.ordered_ids.is_empty() {
        return Err(ApiError::validation("ordered_ids cannot be empty"));
    }

    state
        .store()
        .reorder_subgenres(&payload.ordered_ids)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let subgenres = state
        .store()
        .list_subgenres(true)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        subgenres.into_iter().map(SubgenreDto::from).collect(),
    )))
}
