use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::CatalogClient;

const WATCHMODE_API: &str = "https://api.watchmode.com/v1";

/// A title as it appears in paged list responses. Cheap to fetch in bulk;
/// details and sources need separate per-title calls.
#[derive(Debug, Clone, Deserialize)]
pub struct TitleCandidate {
    pub id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<i64>,
    #[serde(rename = "type")]
    pub title_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(default, alias = "releases")]
    pub titles: Vec<TitleCandidate>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_results: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitleDetails {
    pub id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<i64>,
    #[serde(rename = "type")]
    pub title_type: Option<String>,
    pub plot_overview: Option<String>,
    pub poster: Option<String>,
    pub user_rating: Option<f64>,
    pub critic_score: Option<f64>,
    #[serde(default)]
    pub genres: Vec<i32>,
    #[serde(default)]
    pub genre_names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitleSource {
    pub source_id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: Option<String>,
    pub region: Option<String>,
    pub web_url: Option<String>,
    pub seasons: Option<i32>,
    pub episodes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogGenre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSource {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: Option<String>,
    pub logo_100px: Option<String>,
}

#[derive(Clone)]
pub struct WatchmodeClient {
    client: Client,
    api_key: String,
}

impl WatchmodeClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Watchmode API error: {} - {}", status, body));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CatalogClient for WatchmodeClient {
    async fn search_titles(&self, genre_id: i32, page: u32, page_size: u32) -> Result<SearchPage> {
        let url = format!(
            "{}/list-titles/?apiKey={}&genres={}&types=movie,tv_series&sort_by=popularity_desc&page={}&limit={}",
            WATCHMODE_API, self.api_key, genre_id, page, page_size
        );
        self.get_json(&url).await
    }

    async fn recent_releases(
        &self,
        days_back: u32,
        page: u32,
        page_size: u32,
    ) -> Result<SearchPage> {
        let start_date = (chrono::Utc::now() - chrono::Duration::days(i64::from(days_back)))
            .format("%Y%m%d")
            .to_string();
        let url = format!(
            "{}/releases/?apiKey={}&start_date={}&page={}&limit={}",
            WATCHMODE_API, self.api_key, start_date, page, page_size
        );
        self.get_json(&url).await
    }

    async fn get_title_details(&self, title_id: i64) -> Result<TitleDetails> {
        let url = format!(
            "{}/title/{}/details/?apiKey={}",
            WATCHMODE_API, title_id, self.api_key
        );
        self.get_json(&url).await
    }

    async fn get_title_sources(&self, title_id: i64) -> Result<Vec<TitleSource>> {
        let url = format!(
            "{}/title/{}/sources/?apiKey={}",
            WATCHMODE_API, title_id, self.api_key
        );
        self.get_json(&url).await
    }

    async fn list_genres(&self) -> Result<Vec<CatalogGenre>> {
        let url = format!("{}/genres/?apiKey={}", WATCHMODE_API, self.api_key);
        self.get_json(&url).await
    }

    async fn list_sources(&self) -> Result<Vec<CatalogSource>> {
        let url = format!("{}/sources/?apiKey={}", WATCHMODE_API, self.api_key);
        self.get_json(&url).await
    }
}
