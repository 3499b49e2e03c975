use axum::{Json, extract::State};
use std::sync::Arc;
use tower_sessions::Session;

use super::{
    ApiError, ApiResponse, AppState, FeedbackDto, IssueDto, SubmitFeedbackRequest,
    SubmitIssueRequest, validation,
};

/// POST /api/feedback
/// Public submission; a logged-in session attributes the entry to the user.
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SubmitFeedbackRequest>,
) -> Result<Json<ApiResponse<FeedbackDto>>, ApiError> {
    let message = validation::validate_message(&payload.message, "Feedback message")?;
    let category = payload.category.unwrap_or_else(|| "general".to_string());

    let user_id = match session.get::<String>("user").await.ok().flatten() {
        Some(username) => state
            .store()
            .get_user_by_username(&username)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?
            .map(|u| u.id),
        None => None,
    };

    let entry = state
        .store()
        .add_feedback(user_id, &category, &message)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(entry.into())))
}

/// POST /api/issues
/// Report a problem with a catalog entry (wrong poster, bad metadata).
pub async fn submit_issue(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitIssueRequest>,
) -> Result<Json<ApiResponse<IssueDto>>, ApiError> {
    let description = validation::validate_message(&payload.description, "Issue description")?;

    if let Some(content_id) = payload.content_id {
        if state
            .store()
            .get_content_model(content_id)
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?
            .is_none()
        {
            return Err(ApiError::content_not_found(content_id));
        }
    }

    let entry = state
        .store()
        .add_issue(payload.content_id, &description)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(entry.into())))
}
