use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, WatchlistRequest, auth};
use crate::models::content::ContentRecord;

async fn session_user_id(state: &AppState, session: &Session) -> Result<i32, ApiError> {
    let username = auth::get_session_username(session).await?;
    let user = state
        .store()
        .get_user_by_username(&username)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;
    Ok(user.id)
}

/// GET /api/watchlist
/// The session user's watchlist, hydrated, newest first.
pub async fn get_watchlist(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<ContentRecord>>>, ApiError> {
    let user_id = session_user_id(&state, &session).await?;

    let ids = state
        .store()
        .watchlist_content_ids(user_id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(record) = state
            .store()
            .get_content(id)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        {
            records.push(record);
        }
    }

    Ok(Json(ApiResponse::success(records)))
}

/// POST /api/watchlist
pub async fn add_to_watchlist(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<WatchlistRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user_id = session_user_id(&state, &session).await?;

    if state
        .store()
        .get_content_model(payload.content_id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::content_not_found(payload.content_id));
    }

    state
        .store()
        .add_to_watchlist(user_id, payload.content_id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(())))
}

/// DELETE /api/watchlist/{content_id}
pub async fn remove_from_watchlist(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(content_id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user_id = session_user_id(&state, &session).await?;

    let removed = state
        .store()
        .remove_from_watchlist(user_id, content_id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if !removed {
        return Err(ApiError::NotFound(format!(
            "Content {content_id} is not on the watchlist"
        )));
    }

    Ok(Json(ApiResponse::success(())))
}
