use serde::{Deserialize, Serialize};

use crate::entities::{feedback, issues, platforms, subgenres};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SubgenreDto {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
    pub is_active: bool,
}

impl From<subgenres::Model> for SubgenreDto {
    fn from(model: subgenres::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            sort_order: model.sort_order,
            is_active: model.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlatformDto {
    pub id: i32,
    pub key: String,
    pub name: String,
    pub source_id: i32,
    pub logo_url: Option<String>,
}

impl From<platforms::Model> for PlatformDto {
    fn from(model: platforms::Model) -> Self {
        Self {
            id: model.id,
            key: model.key,
            name: model.name,
            source_id: model.source_id,
            logo_url: model.logo_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedbackDto {
    pub id: i32,
    pub user_id: Option<i32>,
    pub category: String,
    pub message: String,
    pub created_at: Option<String>,
}

impl From<feedback::Model> for FeedbackDto {
    fn from(model: feedback::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            category: model.category,
            message: model.message,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IssueDto {
    pub id: i32,
    pub content_id: Option<i32>,
    pub description: String,
    pub status: String,
    pub created_at: Option<String>,
}

impl From<issues::Model> for IssueDto {
    fn from(model: issues::Model) -> Self {
        Self {
            id: model.id,
            content_id: model.content_id,
            description: model.description,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSubgenreRequest {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubgenreRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderSubgenresRequest {
    pub ordered_ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SetSubgenresRequest {
    pub subgenre_ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SetPrimarySubgenreRequest {
    pub subgenre_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct AddSubgenreRequest {
    pub subgenre_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct SetUsageRequest {
    pub count: i32,
}

#[derive(Debug, Deserialize)]
pub struct SubmitFeedbackRequest {
    pub category: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitIssueRequest {
    pub content_id: Option<i32>,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateIssueRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct WatchlistRequest {
    pub content_id: i32,
}

const fn default_true() -> bool {
    true
}
