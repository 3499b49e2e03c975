use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{api_usage, contents, content_platforms, feedback, issues, platforms, subgenres};
use crate::models::content::{ContentPatch, ContentRecord, NewContent, SubgenreTag};
use crate::query::FilterSpec;

pub mod migrator;
pub mod repositories;

pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // Sqlite urls get their backing file created up front; postgres
        // urls pass straight through to the driver.
        if let Some(path_str) = db_url.strip_prefix("sqlite:") {
            if !path_str.starts_with(":memory:") {
                if let Some(parent) = Path::new(path_str).parent() {
                    tokio::fs::create_dir_all(parent).await.ok();
                }
                if !Path::new(path_str).exists() {
                    std::fs::File::create(path_str)?;
                }
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn content_repo(&self) -> repositories::content::ContentRepository {
        repositories::content::ContentRepository::new(self.conn.clone())
    }

    fn subgenre_repo(&self) -> repositories::subgenre::SubgenreRepository {
        repositories::subgenre::SubgenreRepository::new(self.conn.clone())
    }

    fn platform_repo(&self) -> repositories::platform::PlatformRepository {
        repositories::platform::PlatformRepository::new(self.conn.clone())
    }

    fn usage_repo(&self) -> repositories::usage::UsageRepository {
        repositories::usage::UsageRepository::new(self.conn.clone())
    }

    fn watchlist_repo(&self) -> repositories::watchlist::WatchlistRepository {
        repositories::watchlist::WatchlistRepository::new(self.conn.clone())
    }

    fn feedback_repo(&self) -> repositories::feedback::FeedbackRepository {
        repositories::feedback::FeedbackRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    // ========== Content ==========

    pub async fn list_content(&self, spec: &FilterSpec) -> Result<Vec<ContentRecord>> {
        self.content_repo().list(spec).await
    }

    pub async fn get_content(&self, id: i32) -> Result<Option<ContentRecord>> {
        self.content_repo().get(id).await
    }

    pub async fn get_content_model(&self, id: i32) -> Result<Option<contents::Model>> {
        self.content_repo().get_model(id).await
    }

    pub async fn create_content(&self, input: &NewContent) -> Result<contents::Model> {
        self.content_repo().create(input).await
    }

    pub async fn update_content(
        &self,
        id: i32,
        patch: &ContentPatch,
    ) -> Result<Option<contents::Model>> {
        self.content_repo().update(id, patch).await
    }

    pub async fn remove_content(&self, id: i32) -> Result<bool> {
        self.content_repo().remove(id).await
    }

    pub async fn set_content_hidden(&self, id: i32, hidden: bool) -> Result<bool> {
        self.content_repo().set_hidden(id, hidden).await
    }

    pub async fn find_content_by_watchmode_id(
        &self,
        watchmode_id: i64,
    ) -> Result<Option<contents::Model>> {
        self.content_repo().find_by_watchmode_id(watchmode_id).await
    }

    pub async fn find_content_by_title_year(
        &self,
        title: &str,
        year: i32,
    ) -> Result<Option<contents::Model>> {
        self.content_repo().find_by_title_year(title, year).await
    }

    pub async fn subgenres_for_content(&self, content_id: i32) -> Result<Vec<SubgenreTag>> {
        self.content_repo().subgenres_for(content_id).await
    }

    pub async fn set_content_subgenres(&self, content_id: i32, subgenre_ids: &[i32]) -> Result<()> {
        self.content_repo()
            .set_subgenres(content_id, subgenre_ids)
            .await
    }

    pub async fn add_content_subgenre(&self, content_id: i32, subgenre_id: i32) -> Result<()> {
        self.content_repo()
            .add_subgenre(content_id, subgenre_id)
            .await
    }

    pub async fn remove_content_subgenre(&self, content_id: i32, subgenre_id: i32) -> Result<bool> {
        self.content_repo()
            .remove_subgenre(content_id, subgenre_id)
            .await
    }

    pub async fn set_primary_subgenre(&self, content_id: i32, subgenre_id: i32) -> Result<()> {
        self.content_repo()
            .set_primary_subgenre(content_id, subgenre_id)
            .await
    }

    pub async fn platform_links_for_content(
        &self,
        content_id: i32,
    ) -> Result<Vec<(content_platforms::Model, Option<platforms::Model>)>> {
        self.content_repo().platform_links_for(content_id).await
    }

    pub async fn upsert_platform_link(
        &self,
        content_id: i32,
        platform_id: i32,
        web_url: Option<&str>,
        seasons: Option<i32>,
        episodes: Option<i32>,
    ) -> Result<()> {
        self.content_repo()
            .upsert_platform_link(content_id, platform_id, web_url, seasons, episodes)
            .await
    }

    pub async fn remove_platform_link(&self, content_id: i32, platform_id: i32) -> Result<bool> {
        self.content_repo()
            .remove_platform_link(content_id, platform_id)
            .await
    }

    // ========== Subgenres ==========

    pub async fn list_subgenres(&self, include_inactive: bool) -> Result<Vec<subgenres::Model>> {
        self.subgenre_repo().list(include_inactive).await
    }

    pub async fn get_subgenre(&self, id: i32) -> Result<Option<subgenres::Model>> {
        self.subgenre_repo().get(id).await
    }

    pub async fn get_subgenre_by_slug(&self, slug: &str) -> Result<Option<subgenres::Model>> {
        self.subgenre_repo().get_by_slug(slug).await
    }

    pub async fn create_subgenre(
        &self,
        name: &str,
        slug: &str,
        is_active: bool,
    ) -> Result<subgenres::Model> {
        self.subgenre_repo().create(name, slug, is_active).await
    }

    pub async fn update_subgenre(
        &self,
        id: i32,
        name: Option<&str>,
        slug: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<subgenres::Model>> {
        self.subgenre_repo().update(id, name, slug, is_active).await
    }

    pub async fn remove_subgenre(&self, id: i32) -> Result<bool> {
        self.subgenre_repo().remove(id).await
    }

    pub async fn reorder_subgenres(&self, ordered_ids: &[i32]) -> Result<()> {
        self.subgenre_repo().reorder(ordered_ids).await
    }

    // ========== Platforms ==========

    pub async fn list_platforms(&self) -> Result<Vec<platforms::Model>> {
        self.platform_repo().list().await
    }

    pub async fn get_platform(&self, id: i32) -> Result<Option<platforms::Model>> {
        self.platform_repo().get(id).await
    }

    pub async fn get_or_create_platform(
        &self,
        source_id: i32,
        name: &str,
        logo_url: Option<&str>,
    ) -> Result<platforms::Model> {
        self.platform_repo()
            .get_or_create_by_source_id(source_id, name, logo_url)
            .await
    }

    pub async fn update_platform_logo(
        &self,
        id: i32,
        logo_url: &str,
    ) -> Result<Option<platforms::Model>> {
        self.platform_repo().update_logo(id, logo_url).await
    }

    // ========== Usage ledger ==========

    pub async fn usage_for_month(&self, month: &str) -> Result<Option<api_usage::Model>> {
        self.usage_repo().get_month(month).await
    }

    pub async fn usage_for_month_or_create(&self, month: &str) -> Result<api_usage::Model> {
        self.usage_repo().get_or_create_month(month).await
    }

    pub async fn try_add_usage(&self, month: &str, cost: i32, limit: i32) -> Result<bool> {
        self.usage_repo().try_add(month, cost, limit).await
    }

    pub async fn subtract_usage(&self, month: &str, amount: i32) -> Result<()> {
        self.usage_repo().subtract(month, amount).await
    }

    pub async fn set_usage_count(&self, month: &str, count: i32) -> Result<()> {
        self.usage_repo().set_count(month, count).await
    }

    // ========== Watchlist ==========

    pub async fn watchlist_content_ids(&self, user_id: i32) -> Result<Vec<i32>> {
        self.watchlist_repo().content_ids_for_user(user_id).await
    }

    pub async fn add_to_watchlist(&self, user_id: i32, content_id: i32) -> Result<()> {
        self.watchlist_repo().add(user_id, content_id).await
    }

    pub async fn remove_from_watchlist(&self, user_id: i32, content_id: i32) -> Result<bool> {
        self.watchlist_repo().remove(user_id, content_id).await
    }

    // ========== Feedback & issues ==========

    pub async fn add_feedback(
        &self,
        user_id: Option<i32>,
        category: &str,
        message: &str,
    ) -> Result<feedback::Model> {
        self.feedback_repo()
            .add_feedback(user_id, category, message)
            .await
    }

    pub async fn list_feedback(&self) -> Result<Vec<feedback::Model>> {
        self.feedback_repo().list_feedback().await
    }

    pub async fn add_issue(
        &self,
        content_id: Option<i32>,
        description: &str,
    ) -> Result<issues::Model> {
        self.feedback_repo().add_issue(content_id, description).await
    }

    pub async fn list_issues(&self) -> Result<Vec<issues::Model>> {
        self.feedback_repo().list_issues().await
    }

    pub async fn set_issue_status(&self, id: i32, status: &str) -> Result<Option<issues::Model>> {
        self.feedback_repo().set_issue_status(id, status).await
    }

    // ========== Users ==========

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user_password(&self, username: &str, new_password: &str) -> Result<()> {
        self.user_repo()
            .update_password(username, new_password)
            .await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn regenerate_user_api_key(&self, username: &str) -> Result<String> {
        self.user_repo().regenerate_api_key(username).await
    }
}
