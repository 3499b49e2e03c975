use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, SetUsageRequest};
use crate::clients::watchmode::{CatalogGenre, CatalogSource};
use crate::services::{SyncParams, SyncReport, SyncStrategy, UsageStatus};

/// POST /api/content/sync
/// Bulk sync of the configured genre catalog. Refuses with 429 when the
/// monthly quota is spent.
pub async fn run_catalog_sync(
    State(state): State<Arc<AppState>>,
    Json(params): Json<SyncParams>,
) -> Result<Json<ApiResponse<SyncReport>>, ApiError> {
    let report = state
        .sync_service()
        .run(SyncStrategy::GenreCatalog, &params)
        .await?;

    Ok(Json(ApiResponse::success(report)))
}

/// POST /api/admin/sync-new-to-streaming
pub async fn run_recent_sync(
    State(state): State<Arc<AppState>>,
    Json(params): Json<SyncParams>,
) -> Result<Json<ApiResponse<SyncReport>>, ApiError> {
    let days_back = state.shared.config.read().await.sync.recent_days_back;

    let report = state
        .sync_service()
        .run(SyncStrategy::RecentReleases { days_back }, &params)
        .await?;

    Ok(Json(ApiResponse::success(report)))
}

/// GET /api/watchmode/status
pub async fn usage_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<UsageStatus>>, ApiError> {
    let status = state.ledger().status().await?;
    Ok(Json(ApiResponse::success(status)))
}

/// PUT /api/admin/watchmode/usage
/// Manual override of the raw counter, for reconciling against the
/// provider's dashboard.
pub async fn set_usage(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SetUsageRequest>,
) -> Result<Json<ApiResponse<UsageStatus>>, ApiError> {
    if payload.count < 0 {
        return Err(ApiError::validation("Usage count cannot be negative"));
    }

    let status = state.ledger().set_used(payload.count).await?;
    Ok(Json(ApiResponse::success(status)))
}

/// GET /api/admin/watchmode/genres
/// Provider genre taxonomy, used by the admin UI to map catalog genres
/// onto local subgenres.
pub async fn list_catalog_genres(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CatalogGenre>>>, ApiError> {
    let genres = state
        .shared
        .catalog
        .list_genres()
        .await
        .map_err(|e| ApiError::watchmode_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(genres)))
}

/// GET /api/admin/watchmode/sources
pub async fn list_catalog_sources(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CatalogSource>>>, ApiError> {
    let sources = state
        .shared
        .catalog
        .list_sources()
        .await
        .map_err(|e| ApiError::watchmode_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(sources)))
}
