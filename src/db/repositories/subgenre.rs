use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::entities::{prelude::*, subgenres};

pub struct SubgenreRepository {
    conn: DatabaseConnection,
}

impl SubgenreRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<subgenres::Model>> {
        let mut select = Subgenres::find();
        if !include_inactive {
            select = select.filter(subgenres::Column::IsActive.eq(true));
        }
        Ok(select
            .order_by_asc(subgenres::Column::SortOrder)
            .order_by_asc(subgenres::Column::Name)
            .all(&self.conn)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<Option<subgenres::Model>> {
        Ok(Subgenres::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<subgenres::Model>> {
        Ok(Subgenres::find()
            .filter(subgenres::Column::Slug.eq(slug))
            .one(&self.conn)
            .await?)
    }

    pub async fn create(
        &self,
        name: &str,
        slug: &str,
        is_active: bool,
    ) -> Result<subgenres::Model> {
        // New entries go to the end of the display order.
        let max_order = Subgenres::find()
            .order_by_desc(subgenres::Column::SortOrder)
            .one(&self.conn)
            .await?
            .map_or(0, |s| s.sort_order);

        let model = subgenres::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            sort_order: Set(max_order + 1),
            is_active: Set(is_active),
        }
        .insert(&self.conn)
        .await?;

        info!(id = model.id, slug = %model.slug, "Created subgenre");
        Ok(model)
    }

    pub async fn update(
        &self,
        id: i32,
        name: Option<&str>,
        slug: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<subgenres::Model>> {
        let Some(model) = Subgenres::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };
        let mut active: subgenres::ActiveModel = model.into();
        if let Some(name) = name {
            active.name = Set(name.to_string());
        }
        if let Some(slug) = slug {
            active.slug = Set(slug.to_string());
        }
        if let Some(is_active) = is_active {
            active.is_active = Set(is_active);
        }
        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = Subgenres::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// Rewrite sort_order 1..N for the given ordered id list in one
    /// transaction, so readers never observe a partially reordered list.
    pub async fn reorder(&self, ordered_ids: &[i32]) -> Result<()> {
        let txn = self.conn.begin().await?;
        for (index, &id) in ordered_ids.iter().enumerate() {
            let position = i32::try_from(index).unwrap_or(i32::MAX - 1) + 1;
            Subgenres::update_many()
                .col_expr(subgenres::Column::SortOrder, Expr::value(position))
                .filter(subgenres::Column::Id.eq(id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        info!(count = ordered_ids.len(), "Reordered subgenres");
        Ok(())
    }
}
