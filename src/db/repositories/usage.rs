use anyhow::Result;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set};

use crate::entities::{api_usage, prelude::*};

/// Persistence for the monthly external-API quota ledger. All mutation is
/// expressed as atomic single-statement updates so concurrent sync runs
/// cannot interleave a read-then-write on the counter.
pub struct UsageRepository {
    conn: DatabaseConnection,
}

impl UsageRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create the month row with a zero counter if it does not exist yet.
    /// Safe under concurrency: the unique month index plus
    /// on-conflict-do-nothing makes duplicate creation a no-op.
    pub async fn ensure_month(&self, month: &str) -> Result<()> {
        ApiUsage::insert(api_usage::ActiveModel {
            id: NotSet,
            month: Set(month.to_string()),
            watchmode_requests: Set(0),
            updated_at: Set(Some(chrono::Utc::now().to_rfc3339())),
        })
        .on_conflict(
            OnConflict::column(api_usage::Column::Month)
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(&self.conn)
        .await?;
        Ok(())
    }

    pub async fn get_month(&self, month: &str) -> Result<Option<api_usage::Model>> {
        Ok(ApiUsage::find()
            .filter(api_usage::Column::Month.eq(month))
            .one(&self.conn)
            .await?)
    }

    pub async fn get_or_create_month(&self, month: &str) -> Result<api_usage::Model> {
        self.ensure_month(month).await?;
        self.get_month(month)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Usage row missing after ensure for {month}"))
    }

    /// Conditionally add `cost` to the counter, only if the result stays
    /// within `limit`. Returns false (and leaves the counter untouched)
    /// when the quota would be exceeded. One conditional UPDATE, so the
    /// check and the increment cannot race.
    pub async fn try_add(&self, month: &str, cost: i32, limit: i32) -> Result<bool> {
        self.ensure_month(month).await?;
        let result = ApiUsage::update_many()
            .col_expr(
                api_usage::Column::WatchmodeRequests,
                Expr::col(api_usage::Column::WatchmodeRequests).add(cost),
            )
            .col_expr(
                api_usage::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(api_usage::Column::Month.eq(month))
            .filter(api_usage::Column::WatchmodeRequests.lte(limit - cost))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Return unspent reserved units to the pool (atomic subtract).
    pub async fn subtract(&self, month: &str, amount: i32) -> Result<()> {
        ApiUsage::update_many()
            .col_expr(
                api_usage::Column::WatchmodeRequests,
                Expr::col(api_usage::Column::WatchmodeRequests).sub(amount),
            )
            .col_expr(
                api_usage::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(api_usage::Column::Month.eq(month))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    /// Admin override of the raw counter value.
    pub async fn set_count(&self, month: &str, count: i32) -> Result<()> {
        self.ensure_month(month).await?;
        ApiUsage::update_many()
            .col_expr(api_usage::Column::WatchmodeRequests, Expr::value(count))
            .col_expr(
                api_usage::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(api_usage::Column::Month.eq(month))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}
