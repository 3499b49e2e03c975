use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{
    AddSubgenreRequest, ApiError, ApiResponse, AppState, FeedbackDto, IssueDto,
    SetPrimarySubgenreRequest, SetSubgenresRequest, UpdateIssueRequest, validation,
};
use crate::models::content::{
    ContentPatch, ContentRecord, NewContent, PlatformBadge, PlatformLinkInput, SubgenreTag,
};

async fn hydrated(state: &AppState, id: i32) -> Result<ContentRecord, ApiError> {
    state
        .store()
        .get_content(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::content_not_found(id))
}

/// POST /api/admin/content
pub async fn create_content(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewContent>,
) -> Result<Json<ApiResponse<ContentRecord>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    if payload.content_type != "movie" && payload.content_type != "series" {
        return Err(ApiError::validation(
            "Content type must be 'movie' or 'series'",
        ));
    }
    if payload.content_type == "movie" && (payload.seasons.is_some() || payload.episodes.is_some())
    {
        return Err(ApiError::validation(
            "Seasons and episodes only apply to series",
        ));
    }

    if let Some(watchmode_id) = payload.watchmode_id {
        if state
            .store()
            .find_content_by_watchmode_id(watchmode_id)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?
            .is_some()
        {
            return Err(ApiError::Conflict(format!(
                "Content with external id {watchmode_id} already exists"
            )));
        }
    }

    let created = state
        .store()
        .create_content(&payload)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(hydrated(&state, created.id).await?)))
}

/// PUT /api/admin/content/{id}
pub async fn update_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ContentPatch>,
) -> Result<Json<ApiResponse<ContentRecord>>, ApiError> {
    let id = validation::validate_content_id(id)?;

    if let Some(content_type) = payload.content_type.as_deref() {
        if content_type != "movie" && content_type != "series" {
            return Err(ApiError::validation(
                "Content type must be 'movie' or 'series'",
            ));
        }
    }

    state
        .store()
        .update_content(id, &payload)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::content_not_found(id))?;

    Ok(Json(ApiResponse::success(hydrated(&state, id).await?)))
}

/// DELETE /api/admin/content/{id}
pub async fn delete_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let removed = state
        .store()
        .remove_content(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if !removed {
        return Err(ApiError::content_not_found(id));
    }

    Ok(Json(ApiResponse::success(())))
}

/// POST /api/admin/content/{id}/hide
pub async fn hide_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ContentRecord>>, ApiError> {
    set_hidden(&state, id, true).await
}

/// POST /api/admin/content/{id}/show
pub async fn show_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ContentRecord>>, ApiError> {
    set_hidden(&state, id, false).await
}

async fn set_hidden(
    state: &Arc<AppState>,
    id: i32,
    hidden: bool,
) -> Result<Json<ApiResponse<ContentRecord>>, ApiError> {
    let updated = state
        .store()
        .set_content_hidden(id, hidden)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if !updated {
        return Err(ApiError::content_not_found(id));
    }

    Ok(Json(ApiResponse::success(hydrated(state, id).await?)))
}

/// PUT /api/admin/content/{id}/subgenres
/// Replaces the whole subgenre set. The primary is cleared if it is no
/// longer a member.
pub async fn set_content_subgenres(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<SetSubgenresRequest>,
) -> Result<Json<ApiResponse<ContentRecord>>, ApiError> {
    let id = validation::validate_content_id(id)?;

    if state
        .store()
        .get_content_model(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::content_not_found(id));
    }

    for &subgenre_id in &payload.subgenre_ids {
        if state
            .store()
            .get_subgenre(subgenre_id)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?
            .is_none()
        {
            return Err(ApiError::subgenre_not_found(subgenre_id));
        }
    }

    state
        .store()
        .set_content_subgenres(id, &payload.subgenre_ids)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(hydrated(&state, id).await?)))
}

/// GET /api/admin/content/{id}/subgenres
pub async fn list_content_subgenres(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<SubgenreTag>>>, ApiError> {
    if state
        .store()
        .get_content_model(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::content_not_found(id));
    }

    let tags = state
        .store()
        .subgenres_for_content(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(tags)))
}

/// POST /api/admin/content/{id}/subgenres
/// Adds one subgenre to the set, leaving the rest alone.
pub async fn add_content_subgenre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<AddSubgenreRequest>,
) -> Result<Json<ApiResponse<ContentRecord>>, ApiError> {
    let id = validation::validate_content_id(id)?;

    if state
        .store()
        .get_content_model(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::content_not_found(id));
    }

    if state
        .store()
        .get_subgenre(payload.subgenre_id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::subgenre_not_found(payload.subgenre_id));
    }

    state
        .store()
        .add_content_subgenre(id, payload.subgenre_id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(hydrated(&state, id).await?)))
}

/// DELETE /api/admin/content/{id}/subgenres/{subgenre_id}
/// Removes one subgenre from the set; the primary is cleared if it was
/// the removed one.
pub async fn remove_content_subgenre(
    State(state): State<Arc<AppState>>,
    Path((id, subgenre_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<ContentRecord>>, ApiError> {
    let removed = state
        .store()
        .remove_content_subgenre(id, subgenre_id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if !removed {
        return Err(ApiError::NotFound(format!(
            "Content {id} is not tagged with subgenre {subgenre_id}"
        )));
    }

    Ok(Json(ApiResponse::success(hydrated(&state, id).await?)))
}

/// PUT /api/admin/content/{id}/primary-subgenre
/// Also adds the subgenre to the many-to-many set if missing, keeping the
/// membership invariant.
pub async fn set_primary_subgenre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<SetPrimarySubgenreRequest>,
) -> Result<Json<ApiResponse<ContentRecord>>, ApiError> {
    let id = validation::validate_content_id(id)?;

    if state
        .store()
        .get_content_model(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::content_not_found(id));
    }

    if state
        .store()
        .get_subgenre(payload.subgenre_id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::subgenre_not_found(payload.subgenre_id));
    }

    state
        .store()
        .set_primary_subgenre(id, payload.subgenre_id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(hydrated(&state, id).await?)))
}

/// GET /api/admin/content/{id}/platforms
pub async fn list_content_platforms(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<PlatformBadge>>>, ApiError> {
    if state
        .store()
        .get_content_model(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::content_not_found(id));
    }

    let links = state
        .store()
        .platform_links_for_content(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let badges: Vec<PlatformBadge> = links
        .into_iter()
        .filter_map(|(link, platform)| {
            platform.map(|p| PlatformBadge {
                platform_id: p.id,
                key: p.key,
                name: p.name,
                logo_url: p.logo_url,
                web_url: link.web_url,
                seasons: link.seasons,
                episodes: link.episodes,
            })
        })
        .collect();

    Ok(Json(ApiResponse::success(badges)))
}

/// POST /api/admin/content/{id}/platforms
pub async fn upsert_platform_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<PlatformLinkInput>,
) -> Result<Json<ApiResponse<ContentRecord>>, ApiError> {
    let id = validation::validate_content_id(id)?;

    if state
        .store()
        .get_content_model(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::content_not_found(id));
    }

    if state
        .store()
        .get_platform(payload.platform_id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::not_found("Platform", payload.platform_id));
    }

    state
        .store()
        .upsert_platform_link(
            id,
            payload.platform_id,
            payload.web_url.as_deref(),
            payload.seasons,
            payload.episodes,
        )
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(hydrated(&state, id).await?)))
}

/// DELETE /api/admin/content/{id}/platforms/{platform_id}
pub async fn remove_platform_link(
    State(state): State<Arc<AppState>>,
    Path((id, platform_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<ContentRecord>>, ApiError> {
    let removed = state
        .store()
        .remove_platform_link(id, platform_id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    if !removed {
        return Err(ApiError::NotFound(format!(
            "Content {id} has no link to platform {platform_id}"
        )));
    }

    Ok(Json(ApiResponse::success(hydrated(&state, id).await?)))
}

/// GET /api/admin/feedback
pub async fn list_feedback(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<FeedbackDto>>>, ApiError> {
    let entries = state
        .store()
        .list_feedback()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        entries.into_iter().map(FeedbackDto::from).collect(),
    )))
}

/// GET /api/admin/issues
pub async fn list_issues(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<IssueDto>>>, ApiError> {
    let entries = state
        .store()
        .list_issues()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        entries.into_iter().map(IssueDto::from).collect(),
    )))
}

/// PUT /api/admin/issues/{id}
pub async fn update_issue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateIssueRequest>,
) -> Result<Json<ApiResponse<IssueDto>>, ApiError> {
    let status = payload.status.as_str();
    if !matches!(status, "open" | "in_progress" | "resolved" | "dismissed") {
        return Err(ApiError::validation(
            "Status must be one of: open, in_progress, resolved, dismissed",
        ));
    }

    let issue = state
        .store()
        .set_issue_status(id, status)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Issue", id))?;

    Ok(Json(ApiResponse::success(issue.into())))
}
