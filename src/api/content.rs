use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, auth, validation};
use crate::models::content::ContentRecord;
use crate::query::{ContentFilter, PlatformMatch, build_filter_spec};

/// Query parameters for the public browse endpoint. Everything is
/// optional; values that fail to parse degrade to "no filter".
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentQuery {
    /// Comma-separated platform names.
    pub platform: Option<String>,
    /// Comma-separated platform ids.
    pub platform_ids: Option<String>,
    /// "any" (default) or "all".
    pub platform_match: Option<String>,
    pub year: Option<String>,
    pub min_rating: Option<f64>,
    pub min_critics_rating: Option<f64>,
    pub min_users_rating: Option<f64>,
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub subgenre: Option<String>,
    pub sort_by: Option<String>,
    pub include_hidden: Option<bool>,
    pub include_inactive: Option<bool>,
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

impl ContentQuery {
    fn into_filter(self, is_authenticated: bool) -> ContentFilter {
        let platform_ids = self.platform_ids.as_deref().map(|raw| {
            split_csv(raw)
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect()
        });

        let platform_names = self.platform.as_deref().map(split_csv);

        let platform_match = match self.platform_match.as_deref() {
            Some("all") => PlatformMatch::All,
            _ => PlatformMatch::Any,
        };

        ContentFilter {
            platform_ids,
            platform_match,
            platform_names,
            year: self.year,
            min_rating: self.min_rating,
            min_critics_rating: self.min_critics_rating,
            min_users_rating: self.min_users_rating,
            search: self.search,
            subgenre: self.subgenre,
            content_type: self.content_type,
            sort_by: self.sort_by,
            // Only authenticated callers may widen visibility.
            include_hidden: is_authenticated && self.include_hidden.unwrap_or(false),
            include_inactive: is_authenticated && self.include_inactive.unwrap_or(false),
        }
    }
}

/// GET /api/content
pub async fn list_content(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Query(query): Query<ContentQuery>,
) -> Result<Json<ApiResponse<Vec<ContentRecord>>>, ApiError> {
    let is_authenticated = auth::is_authenticated(&state, &headers, &session).await;
    let spec = build_filter_spec(&query.into_filter(is_authenticated));

    let records = state
        .store()
        .list_content(&spec)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(records)))
}

/// GET /api/platforms
/// Platform list for the browse filter UI.
pub async fn list_platforms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<super::PlatformDto>>>, ApiError> {
    let platforms = state
        .store()
        .list_platforms()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        platforms.into_iter().map(super::PlatformDto::from).collect(),
    )))
}

/// GET /api/content/{id}
pub async fn get_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ContentRecord>>, ApiError> {
    let id = validation::validate_content_id(id)?;

    let record = state
        .store()
        .get_content(id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(|| ApiError::content_not_found(id))?;

    Ok(Json(ApiResponse::success(record)))
}
