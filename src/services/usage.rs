//! Monthly quota governor for the external catalog API.
//!
//! Wraps the persisted per-month counter with a reserve/release contract so
//! the sync pipeline can budget request spend before making any call.

use serde::Serialize;
use thiserror::Error;

use crate::db::Store;

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("Monthly request quota exhausted ({used}/{limit} for {month})")]
    Exhausted {
        month: String,
        used: i32,
        limit: i32,
    },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for QuotaError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageStatus {
    pub month: String,
    pub used: i32,
    pub limit: i32,
    pub remaining: i32,
}

#[derive(Clone)]
pub struct UsageLedger {
    store: Store,
    limit: i32,
}

impl UsageLedger {
    #[must_use]
    pub const fn new(store: Store, limit: i32) -> Self {
        Self { store, limit }
    }

    #[must_use]
    pub fn current_month() -> String {
        chrono::Utc::now().format("%Y-%m").to_string()
    }

    pub async fn status(&self) -> Result<UsageStatus, QuotaError> {
        let month = Self::current_month();
        let row = self.store.usage_for_month_or_create(&month).await?;
        Ok(UsageStatus {
            month,
            used: row.watchmode_requests,
            limit: self.limit,
            remaining: (self.limit - row.watchmode_requests).max(0),
        })
    }

    pub async fn remaining(&self) -> Result<i32, QuotaError> {
        Ok(self.status().await?.remaining)
    }

    /// Atomically claim `cost` units of the current month's budget. The
    /// check and the increment are a single conditional update, so two
    /// concurrent syncs can never jointly overshoot the ceiling.
    pub async fn reserve(&self, cost: i32) -> Result<(), QuotaError> {
        let month = Self::current_month();
        if self
            .store
            .try_add_usage(&month, cost, self.limit)
            .await?
        {
            return Ok(());
        }

        let status = self.status().await?;
        Err(QuotaError::Exhausted {
            month: status.month,
            used: status.used,
            limit: status.limit,
        })
    }

    /// Give back reserved units that were never spent on a real request.
    pub async fn release(&self, amount: i32) -> Result<(), QuotaError> {
        if amount <= 0 {
            return Ok(());
        }
        let month = Self::current_month();
        self.store.subtract_usage(&month, amount).await?;
        Ok(())
    }

    /// Admin override of the raw counter (manual reconciliation).
    pub async fn set_used(&self, count: i32) -> Result<UsageStatus, QuotaError> {
        let month = Self::current_month();
        self.store.set_usage_count(&month, count).await?;
        self.status().await
    }
}
