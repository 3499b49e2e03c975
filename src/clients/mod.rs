use anyhow::Result;
use async_trait::async_trait;

pub mod tvdb;
pub mod watchmode;

pub use tvdb::TvdbClient;
pub use watchmode::WatchmodeClient;

use tvdb::{ArtworkRecord, ArtworkSearchHit};
use watchmode::{CatalogGenre, CatalogSource, SearchPage, TitleDetails, TitleSource};

/// Catalog provider seam. The sync pipeline talks to this trait so it can
/// run against fixtures; the production impl is [`WatchmodeClient`].
/// Every method here costs one unit of the monthly request quota.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// One page of titles carrying the given genre.
    async fn search_titles(&self, genre_id: i32, page: u32, page_size: u32) -> Result<SearchPage>;

    /// One page of titles that newly arrived on streaming sources within
    /// the last `days_back` days.
    async fn recent_releases(&self, days_back: u32, page: u32, page_size: u32)
    -> Result<SearchPage>;

    async fn get_title_details(&self, title_id: i64) -> Result<TitleDetails>;

    async fn get_title_sources(&self, title_id: i64) -> Result<Vec<TitleSource>>;

    async fn list_genres(&self) -> Result<Vec<CatalogGenre>>;

    async fn list_sources(&self) -> Result<Vec<CatalogSource>>;
}

/// Artwork provider seam; the production impl is [`TvdbClient`].
#[async_trait]
pub trait ArtworkClient: Send + Sync {
    async fn movie_by_remote_id(&self, imdb_id: &str) -> Result<Option<ArtworkRecord>>;

    async fn series_by_remote_id(&self, imdb_id: &str) -> Result<Option<ArtworkRecord>>;

    async fn search(&self, query: &str, kind: Option<&str>) -> Result<Vec<ArtworkSearchHit>>;

    /// Normalize an artwork filename or path to an absolute URL.
    fn poster_url(&self, filename: &str) -> String;
}
