use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, QueryOrder, Set,
};

use crate::entities::{prelude::*, watchlist};

pub struct WatchlistRepository {
    conn: DatabaseConnection,
}

impl WatchlistRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Content ids on the user's watchlist, newest first.
    pub async fn content_ids_for_user(&self, user_id: i32) -> Result<Vec<i32>> {
        Ok(Watchlist::find()
            .filter(watchlist::Column::UserId.eq(user_id))
            .order_by_desc(watchlist::Column::AddedAt)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|row| row.content_id)
            .collect())
    }

    /// Idempotent add; (user_id, content_id) is unique.
    pub async fn add(&self, user_id: i32, content_id: i32) -> Result<()> {
        Watchlist::insert(watchlist::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            content_id: Set(content_id),
            added_at: Set(Some(chrono::Utc::now().to_rfc3339())),
        })
        .on_conflict(
            OnConflict::columns([watchlist::Column::UserId, watchlist::Column::ContentId])
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(&self.conn)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, user_id: i32, content_id: i32) -> Result<bool> {
        let result = Watchlist::delete_many()
            .filter(watchlist::Column::UserId.eq(user_id))
            .filter(watchlist::Column::ContentId.eq(content_id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
