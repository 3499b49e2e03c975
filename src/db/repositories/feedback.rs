use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, NotSet, QueryOrder, Set,
};

use crate::entities::{feedback, issues, prelude::*};

pub struct FeedbackRepository {
    conn: DatabaseConnection,
}

impl FeedbackRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add_feedback(
        &self,
        user_id: Option<i32>,
        category: &str,
        message: &str,
    ) -> Result<feedback::Model> {
        Ok(feedback::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            category: Set(category.to_string()),
            message: Set(message.to_string()),
            created_at: Set(Some(chrono::Utc::now().to_rfc3339())),
        }
        .insert(&self.conn)
        .await?)
    }

    pub async fn list_feedback(&self) -> Result<Vec<feedback::Model>> {
        Ok(Feedback::find()
            .order_by_desc(feedback::Column::CreatedAt)
            .all(&self.conn)
            .await?)
    }

    pub async fn add_issue(
        &self,
        content_id: Option<i32>,
        description: &str,
    ) -> Result<issues::Model> {
        Ok(issues::ActiveModel {
            id: NotSet,
            content_id: Set(content_id),
            description: Set(description.to_string()),
            status: Set("open".to_string()),
            created_at: Set(Some(chrono::Utc::now().to_rfc3339())),
        }
        .insert(&self.conn)
        .await?)
    }

    pub async fn list_issues(&self) -> Result<Vec<issues::Model>> {
        Ok(Issues::find()
            .order_by_desc(issues::Column::CreatedAt)
            .all(&self.conn)
            .await?)
    }

    pub async fn set_issue_status(&self, id: i32, status: &str) -> Result<Option<issues::Model>> {
        let Some(model) = Issues::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };
        let mut active: issues::ActiveModel = model.into();
        active.status = Set(status.to_string());
        Ok(Some(active.update(&self.conn).await?))
    }
}
